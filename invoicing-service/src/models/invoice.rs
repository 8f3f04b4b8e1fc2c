//! Invoice record model for invoicing-service.

use crate::models::{LineItem, Totals};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A finalized invoice. Immutable once stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceRecord {
    #[serde(rename = "_id")]
    pub id: String,
    pub owner_id: String,
    pub invoice_number: String,
    pub items: Vec<LineItem>,
    pub totals: Totals,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl InvoiceRecord {
    pub fn new(
        owner_id: String,
        invoice_number: String,
        items: Vec<LineItem>,
        totals: Totals,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            owner_id,
            invoice_number,
            items,
            totals,
            created_at: Utc::now(),
        }
    }
}
