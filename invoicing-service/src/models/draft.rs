use crate::models::LineItem;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Persisted form of a user's in-progress invoice.
///
/// Totals are not stored; they are recomputed from `items` on load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftState {
    #[serde(rename = "_id")]
    pub owner_id: String,
    pub items: Vec<LineItem>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl DraftState {
    pub fn new(owner_id: String, items: Vec<LineItem>) -> Self {
        Self {
            owner_id,
            items,
            updated_at: Utc::now(),
        }
    }
}
