//! MongoDB persistence for users, invoices and drafts.

use crate::models::{DraftState, InvoiceRecord, User};
use crate::services::drafts::DraftRepository;
use crate::services::error::ServiceError;
use crate::services::invoices::InvoiceRepository;
use crate::services::metrics::DB_QUERY_DURATION;
use crate::services::users::UserRepository;
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::doc,
    error::{ErrorKind, WriteFailure},
    options::{FindOptions, IndexOptions, ReplaceOptions},
    Client as MongoClient, Collection, Database, IndexModel,
};
use tracing::instrument;

#[derive(Clone)]
pub struct MongoDb {
    client: MongoClient,
    db: Database,
}

impl MongoDb {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, ServiceError> {
        tracing::info!(database = %database, "Connecting to MongoDB");
        let client = MongoClient::with_uri_str(uri).await.map_err(|e| {
            tracing::error!("Failed to connect to MongoDB: {}", e);
            ServiceError::from(e)
        })?;
        let db = client.database(database);
        tracing::info!(database = %database, "Successfully connected to MongoDB database");
        Ok(Self { client, db })
    }

    pub async fn initialize_indexes(&self) -> Result<(), ServiceError> {
        tracing::info!("Creating MongoDB indexes for invoicing-service");

        let email_index = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(
                IndexOptions::builder()
                    .name("email_unique".to_string())
                    .unique(true)
                    .build(),
            )
            .build();
        self.users().create_index(email_index, None).await?;
        tracing::info!("Created unique index on users.email");

        let number_index = IndexModel::builder()
            .keys(doc! { "invoice_number": 1 })
            .options(
                IndexOptions::builder()
                    .name("invoice_number_unique".to_string())
                    .unique(true)
                    .build(),
            )
            .build();
        self.invoices().create_index(number_index, None).await?;
        tracing::info!("Created unique index on invoices.invoice_number");

        let owner_index = IndexModel::builder()
            .keys(doc! { "owner_id": 1, "created_at": -1 })
            .options(
                IndexOptions::builder()
                    .name("owner_recent_lookup".to_string())
                    .build(),
            )
            .build();
        self.invoices().create_index(owner_index, None).await?;
        tracing::info!("Created index on invoices.(owner_id, created_at)");

        Ok(())
    }

    pub async fn ping(&self) -> Result<(), ServiceError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| {
                tracing::error!("MongoDB health check failed: {}", e);
                ServiceError::from(e)
            })?;
        Ok(())
    }

    pub fn users(&self) -> Collection<User> {
        self.db.collection("users")
    }

    pub fn invoices(&self) -> Collection<InvoiceRecord> {
        self.db.collection("invoices")
    }

    pub fn drafts(&self) -> Collection<DraftState> {
        self.db.collection("drafts")
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(we)) if we.code == 11000
    )
}

#[async_trait]
impl UserRepository for MongoDb {
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    async fn insert(&self, user: &User) -> Result<(), ServiceError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["insert_user"])
            .start_timer();
        let result = self.users().insert_one(user, None).await;
        timer.observe_duration();

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_duplicate_key(&e) => Err(ServiceError::UserAlreadyExists),
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(skip(self))]
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, ServiceError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["find_user_by_email"])
            .start_timer();
        let user = self.users().find_one(doc! { "email": email }, None).await?;
        timer.observe_duration();
        Ok(user)
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: &str) -> Result<Option<User>, ServiceError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["find_user_by_id"])
            .start_timer();
        let user = self.users().find_one(doc! { "_id": id }, None).await?;
        timer.observe_duration();
        Ok(user)
    }

    async fn health_check(&self) -> Result<(), ServiceError> {
        self.ping().await
    }
}

#[async_trait]
impl InvoiceRepository for MongoDb {
    #[instrument(skip(self, record), fields(invoice_number = %record.invoice_number))]
    async fn insert(&self, record: &InvoiceRecord) -> Result<(), ServiceError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["insert_invoice"])
            .start_timer();
        let result = self.invoices().insert_one(record, None).await;
        timer.observe_duration();

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_duplicate_key(&e) => Err(ServiceError::Storage(format!(
                "Duplicate invoice number {}",
                record.invoice_number
            ))),
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(skip(self))]
    async fn list_for_owner(&self, owner_id: &str) -> Result<Vec<InvoiceRecord>, ServiceError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_invoices"])
            .start_timer();
        let options = FindOptions::builder()
            .sort(doc! { "created_at": -1 })
            .build();
        let cursor = self
            .invoices()
            .find(doc! { "owner_id": owner_id }, options)
            .await?;
        let records: Vec<InvoiceRecord> = cursor.try_collect().await?;
        timer.observe_duration();
        Ok(records)
    }

    #[instrument(skip(self))]
    async fn find_for_owner(
        &self,
        owner_id: &str,
        invoice_id: &str,
    ) -> Result<Option<InvoiceRecord>, ServiceError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["find_invoice"])
            .start_timer();
        let record = self
            .invoices()
            .find_one(doc! { "_id": invoice_id, "owner_id": owner_id }, None)
            .await?;
        timer.observe_duration();
        Ok(record)
    }

    async fn health_check(&self) -> Result<(), ServiceError> {
        self.ping().await
    }
}

#[async_trait]
impl DraftRepository for MongoDb {
    #[instrument(skip(self))]
    async fn load(&self, owner_id: &str) -> Result<Option<DraftState>, ServiceError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["load_draft"])
            .start_timer();
        let draft = self.drafts().find_one(doc! { "_id": owner_id }, None).await?;
        timer.observe_duration();
        Ok(draft)
    }

    #[instrument(skip(self, state), fields(owner_id = %state.owner_id))]
    async fn save(&self, state: &DraftState) -> Result<(), ServiceError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["save_draft"])
            .start_timer();
        let options = ReplaceOptions::builder().upsert(true).build();
        self.drafts()
            .replace_one(doc! { "_id": &state.owner_id }, state, options)
            .await?;
        timer.observe_duration();
        Ok(())
    }

    async fn health_check(&self) -> Result<(), ServiceError> {
        self.ping().await
    }
}
