pub mod quote_source;
pub mod store;
pub mod realtime_hub;
pub mod alert_evaluator;
pub mod scheduler;

pub mod watchlist_service;
pub mod alerts_service;
pub mod market_service;

use regex::Regex;

use crate::error::ApiError;

/// Uppercase and validate a ticker symbol coming from a request.
pub fn normalize_symbol(raw: &str) -> Result<String, ApiError> {
    let sym = raw.trim().to_uppercase();

    let re = Regex::new(r"^[A-Z][A-Z0-9.\-]{0,9}$").unwrap();
    if !re.is_match(&sym) {
        return Err(ApiError::Validation("Invalid symbol".to_string()));
    }

    Ok(sym)
}
