use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Aggregate amounts for a set of line items. Always derived, never edited.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    pub subtotal: Decimal,
    pub total_tax: Decimal,
    pub grand_total: Decimal,
}

impl Totals {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn is_zero(&self) -> bool {
        self.subtotal.is_zero() && self.total_tax.is_zero() && self.grand_total.is_zero()
    }
}
