use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertCondition {
    Above,
    Below,
}

impl AlertCondition {
    pub fn as_str(self) -> &'static str {
        match self {
            AlertCondition::Above => "above",
            AlertCondition::Below => "below",
        }
    }

    /// Direction phrase used in notification messages.
    pub fn direction(self) -> &'static str {
        match self {
            AlertCondition::Above => "risen above",
            AlertCondition::Below => "fallen below",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    #[serde(rename = "_id")]
    pub id: ObjectId,

    pub user_id: ObjectId,
    pub symbol: String,

    pub condition: AlertCondition,
    pub target_price: f64,

    // `triggered` is a one-way latch: once set, only an explicit reset
    // re-arms the alert.
    pub triggered: bool,
    pub triggered_at: Option<i64>,
    pub active: bool,

    pub created_at: i64,
}

/// Payload delivered to the owning user's live sessions when an alert fires.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertNotification {
    pub alert_id: String,
    pub symbol: String,
    pub target_price: f64,
    pub current_price: f64,
    pub condition: AlertCondition,
    pub message: String,
}
