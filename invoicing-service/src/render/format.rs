use rust_decimal::{Decimal, RoundingStrategy};

/// Money formatting shared by the on-screen preview and the document.
///
/// Amounts are rounded half away from zero to a fixed number of places and
/// printed after the currency prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmountFormat {
    currency_prefix: String,
    precision: u32,
}

impl AmountFormat {
    pub fn new(currency_prefix: impl Into<String>, precision: u32) -> Self {
        Self {
            currency_prefix: currency_prefix.into(),
            precision,
        }
    }

    pub fn precision(&self) -> u32 {
        self.precision
    }

    /// Number only, e.g. `153.40`.
    pub fn number(&self, value: Decimal) -> String {
        let rounded =
            value.round_dp_with_strategy(self.precision, RoundingStrategy::MidpointAwayFromZero);
        format!("{:.*}", self.precision as usize, rounded)
    }

    /// Number with the currency prefix, e.g. `Rs. 153.40`.
    pub fn money(&self, value: Decimal) -> String {
        if self.currency_prefix.is_empty() {
            return self.number(value);
        }
        format!("{} {}", self.currency_prefix, self.number(value))
    }
}

impl Default for AmountFormat {
    fn default() -> Self {
        Self::new("Rs.", 2)
    }
}
