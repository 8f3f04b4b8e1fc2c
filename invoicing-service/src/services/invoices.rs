//! Invoice record service.

use crate::models::{InvoiceRecord, LineItem, NewLineItem, Totals};
use crate::services::drafts::DraftService;
use crate::services::error::ServiceError;
use crate::services::metrics::INVOICES_CREATED_TOTAL;
use crate::services::numbering::InvoiceNumberGenerator;
use crate::services::totals::TotalsCalculator;
use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::instrument;

#[async_trait]
pub trait InvoiceRepository: Send + Sync {
    async fn insert(&self, record: &InvoiceRecord) -> Result<(), ServiceError>;
    /// Records owned by `owner_id`, newest first.
    async fn list_for_owner(&self, owner_id: &str) -> Result<Vec<InvoiceRecord>, ServiceError>;
    async fn find_for_owner(
        &self,
        owner_id: &str,
        invoice_id: &str,
    ) -> Result<Option<InvoiceRecord>, ServiceError>;
    async fn health_check(&self) -> Result<(), ServiceError>;
}

#[derive(Default)]
pub struct InMemoryInvoiceRepository {
    records: DashMap<String, InvoiceRecord>,
}

impl InMemoryInvoiceRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl InvoiceRepository for InMemoryInvoiceRepository {
    async fn insert(&self, record: &InvoiceRecord) -> Result<(), ServiceError> {
        if self
            .records
            .iter()
            .any(|r| r.invoice_number == record.invoice_number)
        {
            return Err(ServiceError::Storage(format!(
                "Duplicate invoice number {}",
                record.invoice_number
            )));
        }
        self.records.insert(record.id.clone(), record.clone());
        Ok(())
    }

    async fn list_for_owner(&self, owner_id: &str) -> Result<Vec<InvoiceRecord>, ServiceError> {
        let mut records: Vec<_> = self
            .records
            .iter()
            .filter(|r| r.owner_id == owner_id)
            .map(|r| r.value().clone())
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    async fn find_for_owner(
        &self,
        owner_id: &str,
        invoice_id: &str,
    ) -> Result<Option<InvoiceRecord>, ServiceError> {
        Ok(self
            .records
            .get(invoice_id)
            .filter(|r| r.owner_id == owner_id)
            .map(|r| r.value().clone()))
    }

    async fn health_check(&self) -> Result<(), ServiceError> {
        Ok(())
    }
}

#[derive(Clone)]
pub struct InvoiceService {
    repo: Arc<dyn InvoiceRepository>,
    calculator: TotalsCalculator,
    numbers: Arc<InvoiceNumberGenerator>,
}

impl InvoiceService {
    pub fn new(repo: Arc<dyn InvoiceRepository>, calculator: TotalsCalculator) -> Self {
        Self {
            repo,
            calculator,
            numbers: Arc::new(InvoiceNumberGenerator::new()),
        }
    }

    /// Store an immutable snapshot of `items` and `totals` for `owner_id`.
    #[instrument(skip(self, items, totals), fields(owner_id = %owner_id, item_count = items.len()))]
    pub async fn create(
        &self,
        owner_id: &str,
        items: Vec<LineItem>,
        totals: Totals,
    ) -> Result<InvoiceRecord, ServiceError> {
        if let Err(e) = self.validate(&items, &totals) {
            INVOICES_CREATED_TOTAL.with_label_values(&["rejected"]).inc();
            return Err(e);
        }

        let record = InvoiceRecord::new(owner_id.to_string(), self.numbers.next(), items, totals);

        if let Err(e) = self.repo.insert(&record).await {
            INVOICES_CREATED_TOTAL
                .with_label_values(&["storage_error"])
                .inc();
            tracing::error!(error = %e, "Failed to store invoice");
            return Err(e);
        }

        INVOICES_CREATED_TOTAL.with_label_values(&["created"]).inc();
        tracing::info!(
            invoice_id = %record.id,
            invoice_number = %record.invoice_number,
            "Invoice created"
        );
        Ok(record)
    }

    /// Turn the caller's draft into a stored invoice.
    ///
    /// The draft is cleared only after the record is stored.
    #[instrument(skip(self, drafts), fields(owner_id = %owner_id))]
    pub async fn finalize(
        &self,
        drafts: &DraftService,
        owner_id: &str,
    ) -> Result<InvoiceRecord, ServiceError> {
        let draft = drafts.view(owner_id).await;
        if draft.items.is_empty() {
            INVOICES_CREATED_TOTAL.with_label_values(&["rejected"]).inc();
            return Err(ServiceError::Validation(
                "Add at least one product before generating an invoice".to_string(),
            ));
        }

        let record = self.create(owner_id, draft.items, draft.totals).await?;
        if let Err(e) = drafts.clear(owner_id).await {
            tracing::warn!(error = %e, "Failed to clear draft after invoicing");
        }
        Ok(record)
    }

    #[instrument(skip(self), fields(owner_id = %owner_id))]
    pub async fn list_for_user(&self, owner_id: &str) -> Result<Vec<InvoiceRecord>, ServiceError> {
        self.repo.list_for_owner(owner_id).await
    }

    #[instrument(skip(self), fields(owner_id = %owner_id, invoice_id = %invoice_id))]
    pub async fn get(&self, owner_id: &str, invoice_id: &str) -> Result<InvoiceRecord, ServiceError> {
        self.repo
            .find_for_owner(owner_id, invoice_id)
            .await?
            .ok_or(ServiceError::InvoiceNotFound)
    }

    pub async fn health_check(&self) -> Result<(), ServiceError> {
        self.repo.health_check().await
    }

    fn validate(&self, items: &[LineItem], totals: &Totals) -> Result<(), ServiceError> {
        if items.is_empty() {
            return Err(ServiceError::Validation(
                "An invoice needs at least one line item".to_string(),
            ));
        }

        let mut ids = HashSet::new();
        for item in items {
            NewLineItem::parse(&item.name, item.quantity, item.rate)?;
            if !self.calculator.is_consistent(item) {
                return Err(ServiceError::Validation(format!(
                    "Line item {} amounts do not match quantity and rate",
                    item.id
                )));
            }
            if !ids.insert(item.id.as_str()) {
                return Err(ServiceError::Validation(format!(
                    "Duplicate line item id {}",
                    item.id
                )));
            }
        }

        if self.calculator.compute(items)? != *totals {
            return Err(ServiceError::Validation(
                "Totals do not match line items".to_string(),
            ));
        }

        Ok(())
    }
}
