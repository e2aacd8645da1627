//! Product entity owned by the inventory ledger.

use common::ProductId;
use serde::{Deserialize, Serialize};

use crate::Money;

/// A product in the shared inventory.
///
/// Created and priced by catalog management (external to this core); the
/// stock counter is mutated only through the inventory ledger's reserve and
/// release operations, never set directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    id: ProductId,
    name: String,
    stock: u32,
    min_stock: u32,
    unit_price: Money,
}

impl Product {
    /// Creates a new product with an initial stock level.
    pub fn new(
        id: impl Into<ProductId>,
        name: impl Into<String>,
        stock: u32,
        min_stock: u32,
        unit_price: Money,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            stock,
            min_stock,
            unit_price,
        }
    }

    pub fn id(&self) -> &ProductId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current stock on hand. Never negative; `u32` makes that structural.
    pub fn stock(&self) -> u32 {
        self.stock
    }

    /// Reorder threshold used for low-stock warnings.
    pub fn min_stock(&self) -> u32 {
        self.min_stock
    }

    pub fn unit_price(&self) -> Money {
        self.unit_price
    }

    /// Decrements stock if at least `quantity` is on hand.
    ///
    /// Returns false and leaves the counter untouched otherwise. Store
    /// implementations call this under their own atomicity guarantee.
    pub fn try_decrement(&mut self, quantity: u32) -> bool {
        if self.stock >= quantity {
            self.stock -= quantity;
            true
        } else {
            false
        }
    }

    /// Increments stock by `quantity`, saturating at `u32::MAX`.
    pub fn increment(&mut self, quantity: u32) {
        self.stock = self.stock.saturating_add(quantity);
    }
}
