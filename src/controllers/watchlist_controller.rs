use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use mongodb::bson::oid::ObjectId;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    error::ApiError,
    models::{CurrentUser, WatchlistEntry},
    services::watchlist_service::{self, WatchlistUpdate},
    AppState,
};

fn entry_json(e: &WatchlistEntry) -> Value {
    json!({
        "id": e.id.to_hex(),
        "symbol": e.symbol,
        "name": e.name,
        "addedPrice": e.added_price,
        "notes": e.notes,
        "createdAt": e.created_at,
    })
}

fn parse_id(id: &str) -> Result<ObjectId, ApiError> {
    ObjectId::parse_str(id).map_err(|_| ApiError::Validation("Invalid id".to_string()))
}

// GET /api/watchlist
pub async fn get_watchlist(
    State(state): State<AppState>,
    user: Option<Extension<CurrentUser>>,
) -> Result<Json<Value>, ApiError> {
    let Some(Extension(u)) = user else {
        return Err(ApiError::Unauthorized);
    };

    let items = watchlist_service::list_entries(&state, u.id).await?;

    Ok(Json(Value::Array(items.iter().map(entry_json).collect())))
}

#[derive(Deserialize)]
pub struct CreateEntryPayload {
    pub symbol: String,
    pub name: String,

    #[serde(rename = "addedPrice")]
    pub added_price: Option<f64>,

    pub notes: Option<String>,
}

// POST /api/watchlist
pub async fn post_add_entry(
    State(state): State<AppState>,
    user: Option<Extension<CurrentUser>>,
    Json(payload): Json<CreateEntryPayload>,
) -> Result<Response, ApiError> {
    let Some(Extension(u)) = user else {
        return Err(ApiError::Unauthorized);
    };

    let entry = watchlist_service::add_entry(
        &state,
        u.id,
        &payload.symbol,
        &payload.name,
        payload.added_price,
        payload.notes,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(entry_json(&entry))).into_response())
}

#[derive(Deserialize)]
pub struct UpdateEntryPayload {
    pub name: Option<String>,
    pub notes: Option<String>,

    #[serde(rename = "addedPrice")]
    pub added_price: Option<f64>,
}

// PUT /api/watchlist/:id
pub async fn put_update_entry(
    State(state): State<AppState>,
    Path(id): Path<String>,
    user: Option<Extension<CurrentUser>>,
    Json(payload): Json<UpdateEntryPayload>,
) -> Result<Json<Value>, ApiError> {
    let Some(Extension(u)) = user else {
        return Err(ApiError::Unauthorized);
    };

    let oid = parse_id(&id)?;

    let update = WatchlistUpdate {
        name: payload.name,
        notes: payload.notes,
        added_price: payload.added_price,
    };

    let entry = watchlist_service::update_entry(&state, u.id, oid, update).await?;

    Ok(Json(entry_json(&entry)))
}

// DELETE /api/watchlist/:id
pub async fn delete_entry(
    State(state): State<AppState>,
    Path(id): Path<String>,
    user: Option<Extension<CurrentUser>>,
) -> Result<Json<Value>, ApiError> {
    let Some(Extension(u)) = user else {
        return Err(ApiError::Unauthorized);
    };

    let oid = parse_id(&id)?;

    watchlist_service::delete_entry(&state, u.id, oid).await?;

    Ok(Json(json!({ "message": "Watchlist item removed" })))
}
