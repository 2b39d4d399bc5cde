use chrono::Utc;
use futures_util::StreamExt;
use mongodb::bson::{doc, oid::ObjectId, Bson, Document};
use mongodb::options::FindOptions;

use crate::error::ApiError;
use crate::models::{Alert, AlertCondition};
use crate::services::normalize_symbol;
use crate::services::store::ALERTS_COLLECTION;
use crate::AppState;

pub async fn list_alerts(state: &AppState, user_id: ObjectId) -> Result<Vec<Alert>, ApiError> {
    let alerts = state.db.collection::<Alert>(ALERTS_COLLECTION);

    let find_opts = FindOptions::builder()
        .sort(doc! { "created_at": -1 })
        .build();

    let mut cursor = alerts.find(doc! { "user_id": user_id }, find_opts).await?;

    let mut items: Vec<Alert> = Vec::new();
    while let Some(res) = cursor.next().await {
        items.push(res?);
    }

    Ok(items)
}

pub async fn create_alert(
    state: &AppState,
    user_id: ObjectId,
    symbol: &str,
    condition: AlertCondition,
    target_price: f64,
) -> Result<Alert, ApiError> {
    let sym = normalize_symbol(symbol)?;

    if !target_price.is_finite() || target_price <= 0.0 {
        return Err(ApiError::Validation(
            "Please enter a valid target price".to_string(),
        ));
    }

    let alerts = state.db.collection::<Alert>(ALERTS_COLLECTION);

    let alert = Alert {
        id: ObjectId::new(),
        user_id,
        symbol: sym,
        condition,
        target_price,
        triggered: false,
        triggered_at: None,
        active: true,
        created_at: Utc::now().timestamp(),
    };

    alerts.insert_one(&alert, None).await?;

    Ok(alert)
}

#[derive(Debug, Default)]
pub struct AlertUpdate {
    pub target_price: Option<f64>,
    pub condition: Option<AlertCondition>,
    pub active: Option<bool>,
}

pub async fn update_alert(
    state: &AppState,
    user_id: ObjectId,
    id: ObjectId,
    update: AlertUpdate,
) -> Result<Alert, ApiError> {
    let alerts = state.db.collection::<Alert>(ALERTS_COLLECTION);

    let Some(alert) = alerts.find_one(doc! { "_id": id }, None).await? else {
        return Err(ApiError::NotFound("Alert"));
    };

    if alert.user_id != user_id {
        return Err(ApiError::Unauthorized);
    }

    // A triggered alert stays inactive until it is explicitly reset; the
    // reset route is the only re-arm path.
    if alert.triggered && update.active == Some(true) {
        return Err(ApiError::Validation(
            "Alert has already triggered; reset it to re-arm".to_string(),
        ));
    }

    let mut set = Document::new();
    if let Some(price) = update.target_price {
        if !price.is_finite() || price <= 0.0 {
            return Err(ApiError::Validation(
                "Please enter a valid target price".to_string(),
            ));
        }
        set.insert("target_price", price);
    }
    if let Some(condition) = update.condition {
        set.insert("condition", condition.as_str());
    }
    if let Some(active) = update.active {
        set.insert("active", active);
    }

    if set.is_empty() {
        return Ok(alert);
    }

    alerts
        .update_one(doc! { "_id": id }, doc! { "$set": set }, None)
        .await?;

    alerts
        .find_one(doc! { "_id": id }, None)
        .await?
        .ok_or(ApiError::NotFound("Alert"))
}

/// Re-arm a triggered alert: clear the latch and mark it active again.
pub async fn reset_alert(
    state: &AppState,
    user_id: ObjectId,
    id: ObjectId,
) -> Result<Alert, ApiError> {
    let alerts = state.db.collection::<Alert>(ALERTS_COLLECTION);

    let Some(alert) = alerts.find_one(doc! { "_id": id }, None).await? else {
        return Err(ApiError::NotFound("Alert"));
    };

    if alert.user_id != user_id {
        return Err(ApiError::Unauthorized);
    }

    alerts
        .update_one(
            doc! { "_id": id },
            doc! { "$set": { "triggered": false, "triggered_at": Bson::Null, "active": true } },
            None,
        )
        .await?;

    alerts
        .find_one(doc! { "_id": id }, None)
        .await?
        .ok_or(ApiError::NotFound("Alert"))
}

pub async fn delete_alert(
    state: &AppState,
    user_id: ObjectId,
    id: ObjectId,
) -> Result<(), ApiError> {
    let alerts = state.db.collection::<Alert>(ALERTS_COLLECTION);

    let Some(alert) = alerts.find_one(doc! { "_id": id }, None).await? else {
        return Err(ApiError::NotFound("Alert"));
    };

    if alert.user_id != user_id {
        return Err(ApiError::Unauthorized);
    }

    alerts.delete_one(doc! { "_id": id }, None).await?;

    Ok(())
}
