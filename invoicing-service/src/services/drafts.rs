//! Per-user line item stores with a persistence port.
//!
//! Every operation reads the draft through the repository, so instances that
//! share one store see each other's writes. A draft that cannot be loaded, or
//! that fails validation, is discarded and the user starts empty. Writes after
//! each mutation are best-effort: a failed save keeps the draft in a bounded
//! local buffer that later reads prefer until a save succeeds.

use crate::models::{DraftState, LineItem, NewLineItem, Pricing};
use crate::services::error::ServiceError;
use crate::services::line_items::{DraftView, LineItemStore};
use crate::services::metrics::DRAFT_MUTATIONS_TOTAL;
use crate::services::totals::TotalsCalculator;
use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashSet;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::instrument;

#[async_trait]
pub trait DraftRepository: Send + Sync {
    async fn load(&self, owner_id: &str) -> Result<Option<DraftState>, ServiceError>;
    async fn save(&self, state: &DraftState) -> Result<(), ServiceError>;
    async fn health_check(&self) -> Result<(), ServiceError>;
}

/// Draft storage kept in process memory.
#[derive(Default)]
pub struct InMemoryDraftRepository {
    drafts: DashMap<String, DraftState>,
}

impl InMemoryDraftRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DraftRepository for InMemoryDraftRepository {
    async fn load(&self, owner_id: &str) -> Result<Option<DraftState>, ServiceError> {
        Ok(self.drafts.get(owner_id).map(|d| d.value().clone()))
    }

    async fn save(&self, state: &DraftState) -> Result<(), ServiceError> {
        self.drafts.insert(state.owner_id.clone(), state.clone());
        Ok(())
    }

    async fn health_check(&self) -> Result<(), ServiceError> {
        Ok(())
    }
}

/// Upper bound on drafts held back after a failed save.
const MAX_UNSAVED_DRAFTS: usize = 1024;
const LOCK_STRIPES: usize = 64;

#[derive(Debug, Clone)]
struct UnsavedDraft {
    items: Vec<LineItem>,
    seq: u64,
}

#[derive(Clone)]
pub struct DraftService {
    repo: Arc<dyn DraftRepository>,
    calculator: TotalsCalculator,
    locks: Arc<Vec<Mutex<()>>>,
    unsaved: Arc<DashMap<String, UnsavedDraft>>,
    unsaved_seq: Arc<AtomicU64>,
    unsaved_capacity: usize,
}

impl DraftService {
    pub fn new(repo: Arc<dyn DraftRepository>, calculator: TotalsCalculator) -> Self {
        Self {
            repo,
            calculator,
            locks: Arc::new((0..LOCK_STRIPES).map(|_| Mutex::new(())).collect()),
            unsaved: Arc::new(DashMap::new()),
            unsaved_seq: Arc::new(AtomicU64::new(0)),
            unsaved_capacity: MAX_UNSAVED_DRAFTS,
        }
    }

    pub fn with_unsaved_capacity(mut self, capacity: usize) -> Self {
        self.unsaved_capacity = capacity.max(1);
        self
    }

    pub async fn view(&self, owner_id: &str) -> DraftView {
        let _guard = self.lock_for(owner_id).lock().await;
        self.load_store(owner_id).await.view()
    }

    #[instrument(skip(self, input), fields(owner_id = %owner_id))]
    pub async fn add(&self, owner_id: &str, input: NewLineItem) -> Result<DraftView, ServiceError> {
        self.mutate(owner_id, "add", |store| {
            let item = store.add(input)?;
            tracing::info!(item_id = %item.id, "Line item added");
            Ok(())
        })
        .await
    }

    #[instrument(skip(self, pricing), fields(owner_id = %owner_id, item_id = %item_id))]
    pub async fn update(
        &self,
        owner_id: &str,
        item_id: &str,
        pricing: Pricing,
    ) -> Result<DraftView, ServiceError> {
        self.mutate(owner_id, "update", |store| {
            if !store.update(item_id, pricing)? {
                tracing::debug!("Update ignored for unknown line item");
            }
            Ok(())
        })
        .await
    }

    #[instrument(skip(self), fields(owner_id = %owner_id, item_id = %item_id))]
    pub async fn remove(&self, owner_id: &str, item_id: &str) -> Result<DraftView, ServiceError> {
        self.mutate(owner_id, "remove", |store| {
            if !store.remove(item_id)? {
                tracing::debug!("Remove ignored for unknown line item");
            }
            Ok(())
        })
        .await
    }

    #[instrument(skip(self), fields(owner_id = %owner_id))]
    pub async fn clear(&self, owner_id: &str) -> Result<DraftView, ServiceError> {
        self.mutate(owner_id, "clear", |store| {
            store.clear();
            Ok(())
        })
        .await
    }

    pub async fn health_check(&self) -> Result<(), ServiceError> {
        self.repo.health_check().await
    }

    /// Load, apply `f` and save while holding the owner's lock, so saves for
    /// one owner land in the order their mutations ran.
    async fn mutate<F>(&self, owner_id: &str, op: &str, f: F) -> Result<DraftView, ServiceError>
    where
        F: FnOnce(&mut LineItemStore) -> Result<(), ServiceError>,
    {
        let _guard = self.lock_for(owner_id).lock().await;

        let mut store = self.load_store(owner_id).await;
        f(&mut store)?;
        DRAFT_MUTATIONS_TOTAL.with_label_values(&[op]).inc();

        let view = store.view();
        self.persist(owner_id, &view.items).await;
        Ok(view)
    }

    fn lock_for(&self, owner_id: &str) -> &Mutex<()> {
        let mut hasher = DefaultHasher::new();
        owner_id.hash(&mut hasher);
        &self.locks[(hasher.finish() % self.locks.len() as u64) as usize]
    }

    async fn persist(&self, owner_id: &str, items: &[LineItem]) {
        let state = DraftState::new(owner_id.to_string(), items.to_vec());
        match self.repo.save(&state).await {
            Ok(()) => {
                self.unsaved.remove(owner_id);
            }
            Err(e) => {
                tracing::warn!(owner_id = %owner_id, error = %e, "Failed to persist draft");
                self.hold_unsaved(owner_id, items.to_vec());
            }
        }
    }

    fn hold_unsaved(&self, owner_id: &str, items: Vec<LineItem>) {
        if !self.unsaved.contains_key(owner_id) && self.unsaved.len() >= self.unsaved_capacity {
            let oldest = self
                .unsaved
                .iter()
                .min_by_key(|entry| entry.value().seq)
                .map(|entry| entry.key().clone());
            if let Some(oldest) = oldest {
                self.unsaved.remove(&oldest);
                tracing::warn!(owner_id = %oldest, "Dropping unsaved draft");
            }
        }
        self.unsaved.insert(
            owner_id.to_string(),
            UnsavedDraft {
                items,
                seq: self.unsaved_seq.fetch_add(1, Ordering::Relaxed),
            },
        );
    }

    /// The owner's unsaved draft if one is held, otherwise the stored one.
    async fn load_store(&self, owner_id: &str) -> LineItemStore {
        let held = self.unsaved.get(owner_id).map(|d| d.items.clone());
        let loaded = match held {
            Some(items) => Ok(Some(items)),
            None => self
                .repo
                .load(owner_id)
                .await
                .map(|state| state.map(|s| s.items)),
        };

        match loaded {
            Ok(Some(items)) => match validate_items(&items)
                .and_then(|()| LineItemStore::from_items(self.calculator.clone(), items))
            {
                Ok(store) => store,
                Err(e) => {
                    tracing::warn!(owner_id = %owner_id, error = %e, "Discarding invalid saved draft");
                    LineItemStore::new(self.calculator.clone())
                }
            },
            Ok(None) => LineItemStore::new(self.calculator.clone()),
            Err(e) => {
                tracing::warn!(owner_id = %owner_id, error = %e, "Failed to load saved draft, starting empty");
                LineItemStore::new(self.calculator.clone())
            }
        }
    }
}

fn validate_items(items: &[LineItem]) -> Result<(), ServiceError> {
    let mut ids = HashSet::new();
    for item in items {
        NewLineItem::parse(&item.name, item.quantity, item.rate)?;
        if !ids.insert(item.id.as_str()) {
            return Err(ServiceError::Validation(format!(
                "Duplicate line item id {}",
                item.id
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::sync::atomic::AtomicUsize;

    struct FailingDraftRepository {
        saves: AtomicUsize,
    }

    #[async_trait]
    impl DraftRepository for FailingDraftRepository {
        async fn load(&self, _owner_id: &str) -> Result<Option<DraftState>, ServiceError> {
            Err(ServiceError::Storage("corrupt draft".to_string()))
        }

        async fn save(&self, _state: &DraftState) -> Result<(), ServiceError> {
            self.saves.fetch_add(1, Ordering::SeqCst);
            Err(ServiceError::Storage("disk full".to_string()))
        }

        async fn health_check(&self) -> Result<(), ServiceError> {
            Ok(())
        }
    }

    fn pen() -> NewLineItem {
        NewLineItem::parse("Pen", 3, dec!(10)).unwrap()
    }

    #[tokio::test]
    async fn mutations_survive_a_fresh_session() {
        let repo = Arc::new(InMemoryDraftRepository::new());
        let first = DraftService::new(repo.clone(), TotalsCalculator::default());
        first.add("user-1", pen()).await.unwrap();

        let second = DraftService::new(repo, TotalsCalculator::default());
        let view = second.view("user-1").await;
        assert_eq!(view.items.len(), 1);
        assert_eq!(view.totals.grand_total, dec!(35.4));
    }

    #[tokio::test]
    async fn load_failure_starts_empty() {
        let repo = Arc::new(FailingDraftRepository {
            saves: AtomicUsize::new(0),
        });
        let service = DraftService::new(repo, TotalsCalculator::default());
        let view = service.view("user-1").await;
        assert!(view.items.is_empty());
        assert_eq!(view.totals.grand_total, Decimal::ZERO);
    }

    #[tokio::test]
    async fn save_failure_keeps_the_mutation() {
        let repo = Arc::new(FailingDraftRepository {
            saves: AtomicUsize::new(0),
        });
        let service = DraftService::new(repo.clone(), TotalsCalculator::default());

        let view = service.add("user-1", pen()).await.unwrap();
        assert_eq!(view.items.len(), 1);
        assert_eq!(service.view("user-1").await.items.len(), 1);
        assert_eq!(repo.saves.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn invalid_saved_draft_is_discarded() {
        let repo = Arc::new(InMemoryDraftRepository::new());
        let bad = LineItem {
            id: "x".to_string(),
            name: " ".to_string(),
            quantity: 0,
            rate: dec!(1),
            line_total: dec!(0),
            line_tax: dec!(0),
        };
        repo.save(&DraftState::new("user-1".to_string(), vec![bad]))
            .await
            .unwrap();

        let service = DraftService::new(repo, TotalsCalculator::default());
        assert!(service.view("user-1").await.items.is_empty());
    }

    #[tokio::test]
    async fn drafts_are_isolated_per_user() {
        let service = DraftService::new(
            Arc::new(InMemoryDraftRepository::new()),
            TotalsCalculator::default(),
        );
        service.add("user-1", pen()).await.unwrap();
        assert!(service.view("user-2").await.items.is_empty());
    }

    #[tokio::test]
    async fn clear_is_persisted() {
        let repo = Arc::new(InMemoryDraftRepository::new());
        let service = DraftService::new(repo.clone(), TotalsCalculator::default());
        service.add("user-1", pen()).await.unwrap();
        service.clear("user-1").await.unwrap();

        let saved = repo.load("user-1").await.unwrap().unwrap();
        assert!(saved.items.is_empty());
    }

    #[tokio::test]
    async fn writes_from_another_instance_are_seen() {
        let repo = Arc::new(InMemoryDraftRepository::new());
        let a = DraftService::new(repo.clone(), TotalsCalculator::default());
        let b = DraftService::new(repo, TotalsCalculator::default());

        assert!(a.view("user-1").await.items.is_empty());
        b.add("user-1", pen()).await.unwrap();
        assert_eq!(a.view("user-1").await.items.len(), 1);

        a.clear("user-1").await.unwrap();
        assert!(b.view("user-1").await.items.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_mutations_are_all_persisted() {
        let repo = Arc::new(InMemoryDraftRepository::new());
        let service = DraftService::new(repo.clone(), TotalsCalculator::default());

        let tasks: Vec<_> = (0..20)
            .map(|_| {
                let service = service.clone();
                tokio::spawn(async move { service.add("user-1", pen()).await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        assert_eq!(service.view("user-1").await.items.len(), 20);
        let saved = repo.load("user-1").await.unwrap().unwrap();
        assert_eq!(saved.items.len(), 20);
    }

    #[tokio::test]
    async fn unsaved_drafts_are_bounded() {
        let repo = Arc::new(FailingDraftRepository {
            saves: AtomicUsize::new(0),
        });
        let service =
            DraftService::new(repo, TotalsCalculator::default()).with_unsaved_capacity(2);

        for owner in ["user-1", "user-2", "user-3"] {
            service.add(owner, pen()).await.unwrap();
        }

        assert_eq!(service.unsaved.len(), 2);
        assert!(service.view("user-1").await.items.is_empty());
        assert_eq!(service.view("user-3").await.items.len(), 1);
    }

    #[tokio::test]
    async fn overflowing_add_is_rejected_and_not_saved() {
        let repo = Arc::new(InMemoryDraftRepository::new());
        let service = DraftService::new(repo.clone(), TotalsCalculator::default());
        let huge = || NewLineItem::parse("Gold", 1, Decimal::from_scientific("5e28").unwrap()).unwrap();

        service.add("user-1", huge()).await.unwrap();
        let err = service.add("user-1", huge()).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        let saved = repo.load("user-1").await.unwrap().unwrap();
        assert_eq!(saved.items.len(), 1);
        assert_eq!(service.view("user-1").await.items.len(), 1);
    }
}
