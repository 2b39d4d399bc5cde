use serde::{Deserialize, Serialize};

/// One price snapshot for a symbol. Stored append-only; the scheduler's
/// cleanup task purges rows older than the retention window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: String,
    pub price: f64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub volume: i64,

    #[serde(rename = "changePercent")]
    pub change_percent: f64,

    // unix seconds
    pub timestamp: i64,
}
