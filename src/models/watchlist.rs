use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// A symbol a user is tracking. (user_id, symbol) is unique per owner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchlistEntry {
    #[serde(rename = "_id")]
    pub id: ObjectId,

    pub user_id: ObjectId,
    pub symbol: String,
    pub name: String,

    pub added_price: Option<f64>,
    pub notes: Option<String>,

    pub created_at: i64,
}
