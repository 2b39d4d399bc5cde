use chrono::Utc;
use futures_util::StreamExt;
use mongodb::bson::{doc, oid::ObjectId, Document};
use mongodb::options::FindOptions;

use crate::error::ApiError;
use crate::models::WatchlistEntry;
use crate::services::normalize_symbol;
use crate::services::store::WATCHLIST_COLLECTION;
use crate::AppState;

pub async fn list_entries(
    state: &AppState,
    user_id: ObjectId,
) -> Result<Vec<WatchlistEntry>, ApiError> {
    let entries = state.db.collection::<WatchlistEntry>(WATCHLIST_COLLECTION);

    let find_opts = FindOptions::builder()
        .sort(doc! { "created_at": -1 })
        .build();

    let mut cursor = entries.find(doc! { "user_id": user_id }, find_opts).await?;

    let mut items: Vec<WatchlistEntry> = Vec::new();
    while let Some(res) = cursor.next().await {
        items.push(res?);
    }

    Ok(items)
}

pub async fn add_entry(
    state: &AppState,
    user_id: ObjectId,
    symbol: &str,
    name: &str,
    added_price: Option<f64>,
    notes: Option<String>,
) -> Result<WatchlistEntry, ApiError> {
    let sym = normalize_symbol(symbol)?;

    let name = name.trim();
    if name.is_empty() {
        return Err(ApiError::Validation("Please add a name".to_string()));
    }

    let entries = state.db.collection::<WatchlistEntry>(WATCHLIST_COLLECTION);

    // (owner, symbol) is unique: reject the duplicate instead of inserting
    // a second row.
    let existing = entries
        .find_one(doc! { "user_id": user_id, "symbol": &sym }, None)
        .await?;

    if existing.is_some() {
        return Err(ApiError::Validation(
            "Symbol already in watchlist".to_string(),
        ));
    }

    let entry = WatchlistEntry {
        id: ObjectId::new(),
        user_id,
        symbol: sym,
        name: name.to_string(),
        added_price,
        notes,
        created_at: Utc::now().timestamp(),
    };

    entries.insert_one(&entry, None).await?;

    Ok(entry)
}

#[derive(Debug, Default)]
pub struct WatchlistUpdate {
    pub name: Option<String>,
    pub notes: Option<String>,
    pub added_price: Option<f64>,
}

pub async fn update_entry(
    state: &AppState,
    user_id: ObjectId,
    id: ObjectId,
    update: WatchlistUpdate,
) -> Result<WatchlistEntry, ApiError> {
    let entries = state.db.collection::<WatchlistEntry>(WATCHLIST_COLLECTION);

    let Some(entry) = entries.find_one(doc! { "_id": id }, None).await? else {
        return Err(ApiError::NotFound("Watchlist item"));
    };

    if entry.user_id != user_id {
        return Err(ApiError::Unauthorized);
    }

    let mut set = Document::new();
    if let Some(name) = update.name {
        let name = name.trim().to_string();
        // An empty name keeps the existing one.
        if !name.is_empty() {
            set.insert("name", name);
        }
    }
    if let Some(notes) = update.notes {
        set.insert("notes", notes);
    }
    if let Some(price) = update.added_price {
        set.insert("added_price", price);
    }

    if set.is_empty() {
        return Ok(entry);
    }

    entries
        .update_one(doc! { "_id": id }, doc! { "$set": set }, None)
        .await?;

    entries
        .find_one(doc! { "_id": id }, None)
        .await?
        .ok_or(ApiError::NotFound("Watchlist item"))
}

pub async fn delete_entry(
    state: &AppState,
    user_id: ObjectId,
    id: ObjectId,
) -> Result<(), ApiError> {
    let entries = state.db.collection::<WatchlistEntry>(WATCHLIST_COLLECTION);

    let Some(entry) = entries.find_one(doc! { "_id": id }, None).await? else {
        return Err(ApiError::NotFound("Watchlist item"));
    };

    if entry.user_id != user_id {
        return Err(ApiError::Unauthorized);
    }

    entries.delete_one(doc! { "_id": id }, None).await?;

    Ok(())
}
