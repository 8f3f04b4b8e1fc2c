//! Line item model for invoicing-service.

use crate::services::error::ServiceError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub const MAX_NAME_CHARS: usize = 200;

/// One priced entry on an invoice.
///
/// `line_total` and `line_tax` are derived from `quantity`, `rate` and the tax
/// policy in force when the item was priced; they are never edited directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub id: String,
    pub name: String,
    pub quantity: u32,
    pub rate: Decimal,
    pub line_total: Decimal,
    pub line_tax: Decimal,
}

/// Validated input for a new line item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLineItem {
    name: String,
    quantity: u32,
    rate: Decimal,
}

impl NewLineItem {
    /// Non-blank name of bounded length, quantity of at least 1, rate above 0.
    pub fn parse(name: &str, quantity: u32, rate: Decimal) -> Result<Self, ServiceError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ServiceError::Validation(
                "Product name is required".to_string(),
            ));
        }
        if name.chars().count() > MAX_NAME_CHARS {
            return Err(ServiceError::Validation(format!(
                "Product name must be at most {} characters",
                MAX_NAME_CHARS
            )));
        }
        let pricing = Pricing::parse(quantity, rate)?;
        Ok(Self {
            name: name.to_string(),
            quantity: pricing.quantity,
            rate: pricing.rate,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn rate(&self) -> Decimal {
        self.rate
    }
}

/// Validated replacement quantity and rate for an existing line item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pricing {
    pub quantity: u32,
    pub rate: Decimal,
}

impl Pricing {
    pub fn parse(quantity: u32, rate: Decimal) -> Result<Self, ServiceError> {
        if quantity < 1 {
            return Err(ServiceError::Validation(
                "Quantity must be at least 1".to_string(),
            ));
        }
        if rate <= Decimal::ZERO {
            return Err(ServiceError::Validation(
                "Rate must be greater than 0".to_string(),
            ));
        }
        Ok(Self { quantity, rate })
    }
}
