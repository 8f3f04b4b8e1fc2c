//! HTTP handlers for invoicing-service.

pub mod auth;
pub mod health;
pub mod invoices;
pub mod items;
pub mod metrics;
pub mod user;

pub use auth::*;
pub use health::*;
pub use invoices::*;
pub use items::*;
pub use user::*;
