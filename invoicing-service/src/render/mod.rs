//! Invoice document rendering.
//!
//! Rendering is a pure function of its request: items, totals, issuer,
//! invoice number and date. The PDF file embeds a creation timestamp, so
//! determinism is checked on the layout through `content_hash`.

pub mod fonts;
pub mod format;
pub mod layout;
pub mod pdf;
pub mod preview;

use crate::config::DocumentConfig;
use crate::models::{InvoiceRecord, Issuer, LineItem, Totals};
use crate::services::error::ServiceError;
use crate::services::line_items::DraftView;
use crate::services::metrics::{ERRORS_TOTAL, RENDER_DURATION};
use crate::services::totals::TaxPolicy;
use chrono::NaiveDate;
use layout::Document;
use preview::InvoicePreview;

pub const DRAFT_NUMBER: &str = "DRAFT";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderSettings {
    pub brand: String,
    pub tagline: String,
    pub title: String,
    pub currency_prefix: String,
    pub amount_precision: u32,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self::from(&DocumentConfig::default())
    }
}

impl From<&DocumentConfig> for RenderSettings {
    fn from(config: &DocumentConfig) -> Self {
        Self {
            brand: config.brand.clone(),
            tagline: config.tagline.clone(),
            title: config.title.clone(),
            currency_prefix: config.currency_prefix.clone(),
            amount_precision: config.amount_precision,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RenderRequest {
    pub invoice_number: String,
    pub date: NaiveDate,
    pub items: Vec<LineItem>,
    pub totals: Totals,
    pub issuer: Issuer,
}

impl RenderRequest {
    /// A stored invoice, dated on the day it was created.
    pub fn for_record(record: &InvoiceRecord, issuer: Issuer) -> Self {
        Self {
            invoice_number: record.invoice_number.clone(),
            date: record.created_at.date_naive(),
            items: record.items.clone(),
            totals: record.totals,
            issuer,
        }
    }

    pub fn for_draft(draft: DraftView, issuer: Issuer, date: NaiveDate) -> Self {
        Self {
            invoice_number: DRAFT_NUMBER.to_string(),
            date,
            items: draft.items,
            totals: draft.totals,
            issuer,
        }
    }

    pub fn file_name(&self) -> String {
        format!("invoice-{}.pdf", self.invoice_number)
    }
}

#[derive(Debug, Clone)]
pub struct RenderedDocument {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub content_hash: String,
    pub page_count: usize,
}

#[derive(Debug, Clone)]
pub struct DocumentRenderer {
    settings: RenderSettings,
    tax: TaxPolicy,
}

impl DocumentRenderer {
    pub fn new(settings: RenderSettings, tax: TaxPolicy) -> Self {
        Self { settings, tax }
    }

    pub fn preview(&self, request: &RenderRequest) -> InvoicePreview {
        let _timer = RENDER_DURATION
            .with_label_values(&["preview"])
            .start_timer();
        preview::build_preview(request, &self.settings, &self.tax)
    }

    pub fn layout(&self, request: &RenderRequest) -> Document {
        let preview = preview::build_preview(request, &self.settings, &self.tax);
        layout::layout_document(&preview, &self.settings)
    }

    #[tracing::instrument(skip(self, request), fields(invoice_number = %request.invoice_number, items = request.items.len()))]
    pub fn render_pdf(&self, request: &RenderRequest) -> Result<RenderedDocument, ServiceError> {
        let timer = RENDER_DURATION.with_label_values(&["pdf"]).start_timer();

        let document = self.layout(request);
        let content_hash = document.content_hash()?;
        let title = format!("{} {}", self.settings.title, request.invoice_number);
        let bytes = pdf::write_pdf(&document, &title).map_err(|e| {
            ERRORS_TOTAL.with_label_values(&["render"]).inc();
            tracing::error!(error = %e, "PDF generation failed");
            e
        })?;

        timer.observe_duration();
        tracing::info!(
            pages = document.page_count(),
            bytes = bytes.len(),
            "Invoice document rendered"
        );

        Ok(RenderedDocument {
            file_name: request.file_name(),
            bytes,
            content_hash,
            page_count: document.page_count(),
        })
    }
}
