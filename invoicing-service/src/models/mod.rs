//! Domain models for invoicing-service.

mod draft;
mod invoice;
mod line_item;
mod totals;
mod user;

pub use draft::DraftState;
pub use invoice::InvoiceRecord;
pub use line_item::{LineItem, NewLineItem, Pricing, MAX_NAME_CHARS};
pub use totals::Totals;
pub use user::{Issuer, User, PLACEHOLDER_ISSUER_EMAIL, PLACEHOLDER_ISSUER_NAME};
