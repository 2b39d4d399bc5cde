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
    models::{Alert, AlertCondition, CurrentUser},
    services::alerts_service::{self, AlertUpdate},
    AppState,
};

fn alert_json(a: &Alert) -> Value {
    json!({
        "id": a.id.to_hex(),
        "symbol": a.symbol,
        "targetPrice": a.target_price,
        "condition": a.condition.as_str(),
        "triggered": a.triggered,
        "triggeredAt": a.triggered_at,
        "active": a.active,
        "createdAt": a.created_at,
    })
}

fn parse_id(id: &str) -> Result<ObjectId, ApiError> {
    ObjectId::parse_str(id).map_err(|_| ApiError::Validation("Invalid id".to_string()))
}

fn parse_condition(raw: &str) -> Result<AlertCondition, ApiError> {
    match raw.to_lowercase().as_str() {
        "above" => Ok(AlertCondition::Above),
        "below" => Ok(AlertCondition::Below),
        _ => Err(ApiError::Validation(
            "Please choose a valid condition".to_string(),
        )),
    }
}

// GET /api/alerts
pub async fn get_alerts(
    State(state): State<AppState>,
    user: Option<Extension<CurrentUser>>,
) -> Result<Json<Value>, ApiError> {
    let Some(Extension(u)) = user else {
        return Err(ApiError::Unauthorized);
    };

    let items = alerts_service::list_alerts(&state, u.id).await?;

    Ok(Json(Value::Array(items.iter().map(alert_json).collect())))
}

#[derive(Deserialize)]
pub struct CreateAlertPayload {
    pub symbol: String,

    #[serde(rename = "targetPrice")]
    pub target_price: f64,

    pub condition: String,
}

// POST /api/alerts
pub async fn post_create_alert(
    State(state): State<AppState>,
    user: Option<Extension<CurrentUser>>,
    Json(payload): Json<CreateAlertPayload>,
) -> Result<Response, ApiError> {
    let Some(Extension(u)) = user else {
        return Err(ApiError::Unauthorized);
    };

    let condition = parse_condition(&payload.condition)?;

    let alert = alerts_service::create_alert(
        &state,
        u.id,
        &payload.symbol,
        condition,
        payload.target_price,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(alert_json(&alert))).into_response())
}

#[derive(Deserialize)]
pub struct UpdateAlertPayload {
    #[serde(rename = "targetPrice")]
    pub target_price: Option<f64>,

    pub condition: Option<String>,
    pub active: Option<bool>,
}

// PUT /api/alerts/:id
pub async fn put_update_alert(
    State(state): State<AppState>,
    Path(id): Path<String>,
    user: Option<Extension<CurrentUser>>,
    Json(payload): Json<UpdateAlertPayload>,
) -> Result<Json<Value>, ApiError> {
    let Some(Extension(u)) = user else {
        return Err(ApiError::Unauthorized);
    };

    let oid = parse_id(&id)?;

    let condition = match payload.condition {
        Some(raw) => Some(parse_condition(&raw)?),
        None => None,
    };

    let update = AlertUpdate {
        target_price: payload.target_price,
        condition,
        active: payload.active,
    };

    let alert = alerts_service::update_alert(&state, u.id, oid, update).await?;

    Ok(Json(alert_json(&alert)))
}

// POST /api/alerts/:id/reset
pub async fn post_reset_alert(
    State(state): State<AppState>,
    Path(id): Path<String>,
    user: Option<Extension<CurrentUser>>,
) -> Result<Json<Value>, ApiError> {
    let Some(Extension(u)) = user else {
        return Err(ApiError::Unauthorized);
    };

    let oid = parse_id(&id)?;

    let alert = alerts_service::reset_alert(&state, u.id, oid).await?;

    Ok(Json(alert_json(&alert)))
}

// DELETE /api/alerts/:id
pub async fn delete_alert(
    State(state): State<AppState>,
    Path(id): Path<String>,
    user: Option<Extension<CurrentUser>>,
) -> Result<Json<Value>, ApiError> {
    let Some(Extension(u)) = user else {
        return Err(ApiError::Unauthorized);
    };

    let oid = parse_id(&id)?;

    alerts_service::delete_alert(&state, u.id, oid).await?;

    Ok(Json(json!({ "message": "Alert removed" })))
}
