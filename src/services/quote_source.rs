use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use parking_lot::Mutex;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{error::ApiError, models::Quote};

/// External market-data collaborator. The scheduler and the market routes
/// only ever talk to this interface; swapping in a real provider client is a
/// matter of implementing it.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    async fn get_quote(&self, symbol: &str) -> Result<Quote, ApiError>;

    async fn get_bulk_quotes(&self, symbols: &[String]) -> Result<Vec<Quote>, ApiError>;

    async fn get_historical_data(
        &self,
        symbol: &str,
        interval: &str,
        limit: usize,
    ) -> Result<Vec<HistoricalBar>, ApiError>;

    async fn search_symbols(&self, query: &str) -> Result<Vec<SymbolMatch>, ApiError>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoricalBar {
    pub date: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolMatch {
    pub symbol: String,
    pub name: String,
}

const SYMBOL_DIRECTORY: &[(&str, &str)] = &[
    ("AAPL", "Apple Inc."),
    ("AMZN", "Amazon.com Inc."),
    ("GOOGL", "Alphabet Inc."),
    ("META", "Meta Platforms Inc."),
    ("MSFT", "Microsoft Corporation"),
    ("NFLX", "Netflix Inc."),
    ("NVDA", "NVIDIA Corporation"),
    ("TSLA", "Tesla Inc."),
];

/// Synthetic quote source: a small random walk around the last seen price,
/// shared across callers so consecutive quotes for a symbol stay coherent.
pub struct MockQuoteSource {
    last_prices: Mutex<HashMap<String, f64>>,
}

impl MockQuoteSource {
    pub fn new() -> Self {
        Self {
            last_prices: Mutex::new(HashMap::new()),
        }
    }

    fn synth_quote(&self, symbol: &str) -> Quote {
        let sym = symbol.trim().to_uppercase();
        let mut rng = rand::rng();

        let mut prices = self.last_prices.lock();
        let base = *prices
            .entry(sym.clone())
            .or_insert_with(|| rng.random_range(100.0..1100.0));

        let step: f64 = rng.random_range(-0.01..0.01);
        let price = round2((base * (1.0 + step)).max(0.01));
        prices.insert(sym.clone(), price);
        drop(prices);

        let open = round2(base.max(0.01));
        let high = round2(price.max(open) * (1.0 + rng.random_range(0.0..0.01)));
        let low = round2((price.min(open) * (1.0 - rng.random_range(0.0..0.01))).max(0.01));
        let change_percent = round2((price - open) / open * 100.0);

        Quote {
            symbol: sym,
            price,
            open,
            high,
            low,
            volume: rng.random_range(100_000i64..10_000_000),
            change_percent,
            timestamp: Utc::now().timestamp(),
        }
    }

    fn synth_history(&self, symbol: &str, limit: usize) -> Vec<HistoricalBar> {
        let sym = symbol.trim().to_uppercase();
        let mut rng = rand::rng();

        let mut close = self
            .last_prices
            .lock()
            .get(&sym)
            .copied()
            .unwrap_or_else(|| rng.random_range(100.0..1100.0));

        let today = Utc::now();
        let mut bars = Vec::with_capacity(limit);

        // Walk backwards from today so the most recent bar lines up with the
        // current price.
        for i in 0..limit {
            let open = round2((close * (1.0 + rng.random_range(-0.015..0.015))).max(0.01));
            let high = round2(close.max(open) * (1.0 + rng.random_range(0.0..0.02)));
            let low = round2((close.min(open) * (1.0 - rng.random_range(0.0..0.02))).max(0.01));

            bars.push(HistoricalBar {
                date: (today - Duration::days(i as i64)).to_rfc3339(),
                open,
                high,
                low,
                close: round2(close),
                volume: rng.random_range(100_000i64..10_000_000),
            });

            close = open;
        }

        bars.reverse();
        bars
    }
}

impl Default for MockQuoteSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QuoteSource for MockQuoteSource {
    async fn get_quote(&self, symbol: &str) -> Result<Quote, ApiError> {
        if symbol.trim().is_empty() {
            return Err(ApiError::Upstream("empty symbol".to_string()));
        }
        Ok(self.synth_quote(symbol))
    }

    async fn get_bulk_quotes(&self, symbols: &[String]) -> Result<Vec<Quote>, ApiError> {
        let mut quotes = Vec::with_capacity(symbols.len());
        for symbol in symbols {
            quotes.push(self.get_quote(symbol).await?);
        }
        Ok(quotes)
    }

    async fn get_historical_data(
        &self,
        symbol: &str,
        _interval: &str,
        limit: usize,
    ) -> Result<Vec<HistoricalBar>, ApiError> {
        if symbol.trim().is_empty() {
            return Err(ApiError::Upstream("empty symbol".to_string()));
        }
        Ok(self.synth_history(symbol, limit))
    }

    async fn search_symbols(&self, query: &str) -> Result<Vec<SymbolMatch>, ApiError> {
        let q = query.trim().to_lowercase();

        Ok(SYMBOL_DIRECTORY
            .iter()
            .filter(|(symbol, name)| {
                symbol.to_lowercase().contains(&q) || name.to_lowercase().contains(&q)
            })
            .map(|(symbol, name)| SymbolMatch {
                symbol: (*symbol).to_string(),
                name: (*name).to_string(),
            })
            .collect())
    }
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}
