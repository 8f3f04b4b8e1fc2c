use crate::render::format::AmountFormat;
use crate::render::{RenderRequest, RenderSettings};
use crate::services::totals::TaxPolicy;
use serde::Serialize;

/// Display-ready invoice content.
///
/// Both the JSON preview and the document layout are built from this, so
/// every amount is formatted exactly once and the two always agree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvoicePreview {
    pub invoice_number: String,
    pub date: String,
    pub issuer_name: String,
    pub issuer_email: String,
    pub rows: Vec<PreviewRow>,
    pub subtotal: String,
    pub tax_label: String,
    pub tax: String,
    pub grand_total: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreviewRow {
    pub index: usize,
    pub name: String,
    pub quantity: String,
    pub rate: String,
    pub amount: String,
}

pub const DATE_FORMAT: &str = "%d/%m/%Y";

pub fn build_preview(
    request: &RenderRequest,
    settings: &RenderSettings,
    tax: &TaxPolicy,
) -> InvoicePreview {
    let fmt = AmountFormat::new(settings.currency_prefix.clone(), settings.amount_precision);

    let rows = request
        .items
        .iter()
        .enumerate()
        .map(|(index, item)| PreviewRow {
            index,
            name: item.name.clone(),
            quantity: item.quantity.to_string(),
            rate: fmt.money(item.rate),
            amount: fmt.money(item.line_total),
        })
        .collect();

    InvoicePreview {
        invoice_number: request.invoice_number.clone(),
        date: request.date.format(DATE_FORMAT).to_string(),
        issuer_name: request.issuer.display_name().to_string(),
        issuer_email: request.issuer.display_email().to_string(),
        rows,
        subtotal: fmt.money(request.totals.subtotal),
        tax_label: tax.display_label(),
        tax: fmt.money(request.totals.total_tax),
        grand_total: fmt.money(request.totals.grand_total),
    }
}
