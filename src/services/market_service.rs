use futures_util::StreamExt;
use mongodb::bson::doc;
use mongodb::options::FindOptions;

use crate::error::ApiError;
use crate::models::Quote;
use crate::services::store::QUOTES_COLLECTION;
use crate::AppState;

/// Most recent stored quotes for a symbol, newest first.
pub async fn recent_quotes(
    state: &AppState,
    symbol: &str,
    limit: i64,
) -> Result<Vec<Quote>, ApiError> {
    let quotes = state.db.collection::<Quote>(QUOTES_COLLECTION);

    let find_opts = FindOptions::builder()
        .sort(doc! { "timestamp": -1 })
        .limit(limit)
        .build();

    let mut cursor = quotes.find(doc! { "symbol": symbol }, find_opts).await?;

    let mut items: Vec<Quote> = Vec::new();
    while let Some(res) = cursor.next().await {
        items.push(res?);
    }

    Ok(items)
}
