//! Persistence collaborators for the market-data pipeline.
//!
//! The scheduler and evaluator depend on these traits rather than on the
//! database handle directly, so they can be constructed fresh per test with
//! in-memory fakes.

use async_trait::async_trait;
use futures_util::StreamExt;
use mongodb::bson::{doc, oid::ObjectId};
use mongodb::Database;

use crate::{
    error::ApiError,
    models::{Alert, Quote, WatchlistEntry},
};

pub const WATCHLIST_COLLECTION: &str = "watchlist";
pub const ALERTS_COLLECTION: &str = "alerts";
pub const QUOTES_COLLECTION: &str = "market_data";

#[async_trait]
pub trait WatchlistStore: Send + Sync {
    /// Distinct symbols across all users' watchlists.
    async fn distinct_symbols(&self) -> Result<Vec<String>, ApiError>;
}

#[async_trait]
pub trait QuoteStore: Send + Sync {
    async fn insert(&self, quote: &Quote) -> Result<(), ApiError>;

    /// Delete quotes with a timestamp strictly before `cutoff` (unix
    /// seconds). Returns the number of rows removed.
    async fn purge_older_than(&self, cutoff: i64) -> Result<u64, ApiError>;
}

#[async_trait]
pub trait AlertStore: Send + Sync {
    /// Alerts for `symbol` that are active and not yet triggered.
    async fn armed_for_symbol(&self, symbol: &str) -> Result<Vec<Alert>, ApiError>;

    /// Flip the trigger latch. The filter requires `triggered: false`, so a
    /// concurrent pass that already fired the alert makes this return false
    /// and the caller skips its notification.
    async fn mark_triggered(&self, id: ObjectId, at: i64) -> Result<bool, ApiError>;
}

pub struct MongoWatchlistStore {
    db: Database,
}

impl MongoWatchlistStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl WatchlistStore for MongoWatchlistStore {
    async fn distinct_symbols(&self) -> Result<Vec<String>, ApiError> {
        let entries = self.db.collection::<WatchlistEntry>(WATCHLIST_COLLECTION);

        let values = entries.distinct("symbol", None, None).await?;

        Ok(values
            .into_iter()
            .filter_map(|v| v.as_str().map(|s| s.to_uppercase()))
            .collect())
    }
}

pub struct MongoQuoteStore {
    db: Database,
}

impl MongoQuoteStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl QuoteStore for MongoQuoteStore {
    async fn insert(&self, quote: &Quote) -> Result<(), ApiError> {
        let quotes = self.db.collection::<Quote>(QUOTES_COLLECTION);
        quotes.insert_one(quote, None).await?;
        Ok(())
    }

    async fn purge_older_than(&self, cutoff: i64) -> Result<u64, ApiError> {
        let quotes = self.db.collection::<Quote>(QUOTES_COLLECTION);

        let res = quotes
            .delete_many(doc! { "timestamp": { "$lt": cutoff } }, None)
            .await?;

        Ok(res.deleted_count)
    }
}

pub struct MongoAlertStore {
    db: Database,
}

impl MongoAlertStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AlertStore for MongoAlertStore {
    async fn armed_for_symbol(&self, symbol: &str) -> Result<Vec<Alert>, ApiError> {
        let alerts = self.db.collection::<Alert>(ALERTS_COLLECTION);

        let mut cursor = alerts
            .find(
                doc! { "symbol": symbol.to_uppercase(), "active": true, "triggered": false },
                None,
            )
            .await?;

        let mut items: Vec<Alert> = Vec::new();
        while let Some(res) = cursor.next().await {
            items.push(res?);
        }

        Ok(items)
    }

    async fn mark_triggered(&self, id: ObjectId, at: i64) -> Result<bool, ApiError> {
        let alerts = self.db.collection::<Alert>(ALERTS_COLLECTION);

        let res = alerts
            .update_one(
                doc! { "_id": id, "triggered": false },
                doc! { "$set": { "triggered": true, "triggered_at": at, "active": false } },
                None,
            )
            .await?;

        Ok(res.matched_count > 0)
    }
}
