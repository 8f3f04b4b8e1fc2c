//! The in-progress invoice: an ordered list of line items plus its totals.

use crate::models::{LineItem, NewLineItem, Pricing, Totals};
use crate::services::error::ServiceError;
use crate::services::totals::TotalsCalculator;
use serde::Serialize;
use uuid::Uuid;

/// Items and totals as seen by callers after a mutation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DraftView {
    pub items: Vec<LineItem>,
    pub totals: Totals,
}

/// Working list of line items for one session.
///
/// Every mutation leaves `items` and `totals` consistent before returning.
#[derive(Debug, Clone)]
pub struct LineItemStore {
    calculator: TotalsCalculator,
    items: Vec<LineItem>,
    totals: Totals,
}

impl LineItemStore {
    pub fn new(calculator: TotalsCalculator) -> Self {
        Self {
            calculator,
            items: Vec::new(),
            totals: Totals::zero(),
        }
    }

    /// Rebuild a store from persisted items, recomputing every derived amount.
    pub fn from_items(
        calculator: TotalsCalculator,
        items: Vec<LineItem>,
    ) -> Result<Self, ServiceError> {
        let items = items
            .into_iter()
            .map(|mut item| {
                let (line_total, line_tax) = calculator.line_amounts(item.quantity, item.rate)?;
                item.line_total = line_total;
                item.line_tax = line_tax;
                Ok(item)
            })
            .collect::<Result<Vec<_>, ServiceError>>()?;
        let totals = calculator.compute(&items)?;
        Ok(Self {
            calculator,
            items,
            totals,
        })
    }

    /// Append an item. On error the store is left unchanged.
    pub fn add(&mut self, input: NewLineItem) -> Result<&LineItem, ServiceError> {
        let (line_total, line_tax) = self
            .calculator
            .line_amounts(input.quantity(), input.rate())?;
        let mut id = Uuid::new_v4().to_string();
        while self.items.iter().any(|i| i.id == id) {
            id = Uuid::new_v4().to_string();
        }

        let mut items = self.items.clone();
        items.push(LineItem {
            id,
            name: input.name().to_string(),
            quantity: input.quantity(),
            rate: input.rate(),
            line_total,
            line_tax,
        });
        self.commit(items)?;
        Ok(&self.items[self.items.len() - 1])
    }

    /// Replace quantity and rate. Returns false when `id` is unknown.
    pub fn update(&mut self, id: &str, pricing: Pricing) -> Result<bool, ServiceError> {
        let Some(index) = self.items.iter().position(|i| i.id == id) else {
            return Ok(false);
        };
        let (line_total, line_tax) = self
            .calculator
            .line_amounts(pricing.quantity, pricing.rate)?;

        let mut items = self.items.clone();
        let item = &mut items[index];
        item.quantity = pricing.quantity;
        item.rate = pricing.rate;
        item.line_total = line_total;
        item.line_tax = line_tax;
        self.commit(items)?;
        Ok(true)
    }

    /// Remove by id. Returns false when `id` is unknown.
    pub fn remove(&mut self, id: &str) -> Result<bool, ServiceError> {
        if !self.items.iter().any(|i| i.id == id) {
            return Ok(false);
        }
        let items = self.items.iter().filter(|i| i.id != id).cloned().collect();
        self.commit(items)?;
        Ok(true)
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.totals = Totals::zero();
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn totals(&self) -> Totals {
        self.totals
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn view(&self) -> DraftView {
        DraftView {
            items: self.items.clone(),
            totals: self.totals,
        }
    }

    /// Swap in `items` only when their totals can be computed.
    fn commit(&mut self, items: Vec<LineItem>) -> Result<(), ServiceError> {
        let totals = self.calculator.compute(&items)?;
        self.items = items;
        self.totals = totals;
        Ok(())
    }
}
