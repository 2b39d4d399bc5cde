use axum::{
    extract::{Extension, Path, Query, State},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    error::ApiError,
    models::{CurrentUser, Quote},
    services::{market_service, normalize_symbol},
    AppState,
};

// GET /api/market/:symbol
pub async fn get_market_data(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    user: Option<Extension<CurrentUser>>,
) -> Result<Json<Quote>, ApiError> {
    let Some(Extension(_u)) = user else {
        return Err(ApiError::Unauthorized);
    };

    let sym = normalize_symbol(&symbol)?;
    let quote = state.quotes.get_quote(&sym).await?;

    Ok(Json(quote))
}

#[derive(Deserialize)]
pub struct HistoryQuery {
    pub interval: Option<String>,
    pub limit: Option<usize>,
}

// GET /api/market/:symbol/history?interval&limit
pub async fn get_history(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    Query(query): Query<HistoryQuery>,
    user: Option<Extension<CurrentUser>>,
) -> Result<Response, ApiError> {
    let Some(Extension(_u)) = user else {
        return Err(ApiError::Unauthorized);
    };

    let sym = normalize_symbol(&symbol)?;
    let interval = query.interval.unwrap_or_else(|| "1day".to_string());
    let limit = query.limit.unwrap_or(30).clamp(1, 500);

    // Serve from the local series when it has enough rows; otherwise fall
    // back to the quote source.
    let rows = market_service::recent_quotes(&state, &sym, limit as i64).await?;

    if rows.len() >= limit {
        let mut rows = rows;
        rows.reverse();
        return Ok(Json(rows).into_response());
    }

    let bars = state
        .quotes
        .get_historical_data(&sym, &interval, limit)
        .await?;

    Ok(Json(bars).into_response())
}

#[derive(Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

// GET /api/market/search?q=
pub async fn get_search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
    user: Option<Extension<CurrentUser>>,
) -> Result<Response, ApiError> {
    let Some(Extension(_u)) = user else {
        return Err(ApiError::Unauthorized);
    };

    let q = query.q.unwrap_or_default();
    if q.trim().is_empty() {
        return Err(ApiError::Validation("Search query required".to_string()));
    }

    let results = state.quotes.search_symbols(&q).await?;

    Ok(Json(results).into_response())
}

#[derive(Deserialize)]
pub struct BulkPayload {
    pub symbols: Option<Vec<String>>,
}

// POST /api/market/bulk
pub async fn post_bulk(
    State(state): State<AppState>,
    user: Option<Extension<CurrentUser>>,
    Json(payload): Json<BulkPayload>,
) -> Result<Response, ApiError> {
    let Some(Extension(_u)) = user else {
        return Err(ApiError::Unauthorized);
    };

    let symbols = payload.symbols.unwrap_or_default();
    if symbols.is_empty() {
        return Err(ApiError::Validation("Symbols array required".to_string()));
    }

    let symbols = symbols
        .iter()
        .map(|s| normalize_symbol(s))
        .collect::<Result<Vec<_>, _>>()?;

    let quotes = state.quotes.get_bulk_quotes(&symbols).await?;

    Ok(Json(quotes).into_response())
}

// POST /api/market/refresh
//
// Operator escape hatch: run one fetch cycle outside its schedule and wait
// for it to finish.
pub async fn post_refresh(
    State(state): State<AppState>,
    user: Option<Extension<CurrentUser>>,
) -> Result<Json<Value>, ApiError> {
    let Some(Extension(_u)) = user else {
        return Err(ApiError::Unauthorized);
    };

    state.scheduler.run_fetch_cycle().await;

    Ok(Json(json!({ "message": "Market data fetch completed" })))
}
