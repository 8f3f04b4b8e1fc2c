//! Line and invoice total computation.
//!
//! Values keep full decimal precision. Rounding only happens when amounts are
//! formatted for display, so recomputing from the same items is idempotent
//! and independent of item order.

use crate::models::{LineItem, Totals};
use crate::services::error::ServiceError;
use rust_decimal::Decimal;

/// Tax applied on top of each line total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaxPolicy {
    pub rate: Decimal,
    pub label: String,
}

impl TaxPolicy {
    pub fn new(rate: Decimal, label: impl Into<String>) -> Self {
        Self {
            rate,
            label: label.into(),
        }
    }

    /// Label with the percentage, e.g. `GST (18%)`.
    pub fn display_label(&self) -> String {
        let percent = (self.rate * Decimal::ONE_HUNDRED).normalize();
        format!("{} ({}%)", self.label, percent)
    }
}

impl Default for TaxPolicy {
    fn default() -> Self {
        Self::new(Decimal::new(18, 2), "GST")
    }
}

#[derive(Debug, Clone, Default)]
pub struct TotalsCalculator {
    tax: TaxPolicy,
}

impl TotalsCalculator {
    pub fn new(tax: TaxPolicy) -> Self {
        Self { tax }
    }

    /// Returns `(line_total, line_tax)` for one item.
    ///
    /// Amounts beyond the decimal range are a validation error.
    pub fn line_amounts(
        &self,
        quantity: u32,
        rate: Decimal,
    ) -> Result<(Decimal, Decimal), ServiceError> {
        let line_total = Decimal::from(quantity)
            .checked_mul(rate)
            .ok_or_else(amount_too_large)?
            .normalize();
        let line_tax = line_total
            .checked_mul(self.tax.rate)
            .ok_or_else(amount_too_large)?
            .normalize();
        Ok((line_total, line_tax))
    }

    pub fn compute(&self, items: &[LineItem]) -> Result<Totals, ServiceError> {
        let (subtotal, total_tax) = items.iter().try_fold(
            (Decimal::ZERO, Decimal::ZERO),
            |(sub, tax), item| {
                Some((
                    sub.checked_add(item.line_total)?,
                    tax.checked_add(item.line_tax)?,
                ))
            },
        )
        .ok_or_else(amount_too_large)?;
        let grand_total = subtotal
            .checked_add(total_tax)
            .ok_or_else(amount_too_large)?;

        Ok(Totals {
            subtotal: subtotal.normalize(),
            total_tax: total_tax.normalize(),
            grand_total: grand_total.normalize(),
        })
    }

    /// True when the derived amounts on `item` match its quantity and rate.
    pub fn is_consistent(&self, item: &LineItem) -> bool {
        match self.line_amounts(item.quantity, item.rate) {
            Ok((line_total, line_tax)) => {
                line_total == item.line_total && line_tax == item.line_tax
            }
            Err(_) => false,
        }
    }
}

fn amount_too_large() -> ServiceError {
    ServiceError::Validation("Amount is too large to be invoiced".to_string())
}
