use serde::Serialize;

use crate::models::{InvoiceRecord, LineItem, Totals};

#[derive(Debug, Serialize)]
pub struct InvoiceResponse {
    pub id: String,
    pub invoice_number: String,
    pub items: Vec<LineItem>,
    pub totals: Totals,
    pub created_at: String,
}

impl From<InvoiceRecord> for InvoiceResponse {
    fn from(record: InvoiceRecord) -> Self {
        Self {
            id: record.id,
            invoice_number: record.invoice_number,
            items: record.items,
            totals: record.totals,
            created_at: record.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CreateInvoiceResponse {
    pub message: String,
    pub invoice: InvoiceResponse,
}
