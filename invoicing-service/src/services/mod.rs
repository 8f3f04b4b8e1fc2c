//! Services module for invoicing-service.

pub mod auth;
pub mod database;
pub mod drafts;
pub mod error;
pub mod invoices;
pub mod jwt;
pub mod line_items;
pub mod metrics;
pub mod numbering;
pub mod totals;
pub mod users;

pub use auth::{AuthService, Session};
pub use database::MongoDb;
pub use drafts::{DraftRepository, DraftService, InMemoryDraftRepository};
pub use error::ServiceError;
pub use invoices::{InMemoryInvoiceRepository, InvoiceRepository, InvoiceService};
pub use jwt::{AccessTokenClaims, JwtService};
pub use line_items::{DraftView, LineItemStore};
pub use metrics::{get_metrics, init_metrics};
pub use totals::{TaxPolicy, TotalsCalculator};
pub use users::{InMemoryUserRepository, UserRepository};
