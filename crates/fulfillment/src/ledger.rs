//! Inventory ledger: atomic reserve/release over the product store.

use common::ProductId;
use domain::Product;
use store::ProductStore;

use crate::FulfillmentError;

/// Source of truth for per-product stock.
///
/// `reserve` is the only path that can decrease a counter and it delegates
/// the check-and-decrement to the store's conditional operation, so two
/// concurrent reserves on the same product can never both pass a stale
/// check. `release` undoes a prior reservation (cancellation, or
/// compensation of a partially-applied multi-line reservation).
pub struct InventoryLedger<S> {
    products: S,
}

impl<S: ProductStore> InventoryLedger<S> {
    /// Creates a ledger over the given product store.
    pub fn new(products: S) -> Self {
        Self { products }
    }

    /// Atomically decrements stock by `quantity` if enough is on hand.
    #[tracing::instrument(skip(self))]
    pub async fn reserve(
        &self,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<(), FulfillmentError> {
        if self
            .products
            .conditional_decrement(product_id, quantity)
            .await?
        {
            metrics::counter!("stock_reservations_total").increment(1);
            tracing::debug!(%product_id, quantity, "stock reserved");
            return Ok(());
        }

        // The conditional update was rejected: classify why.
        match self.products.get(product_id).await? {
            Some(product) => {
                tracing::warn!(
                    %product_id,
                    available = product.stock(),
                    requested = quantity,
                    "reservation rejected, insufficient stock"
                );
                Err(FulfillmentError::InsufficientStock {
                    product_id: product_id.clone(),
                    available: product.stock(),
                    requested: quantity,
                })
            }
            None => Err(FulfillmentError::ProductNotFound(product_id.clone())),
        }
    }

    /// Atomically increments stock by `quantity`.
    #[tracing::instrument(skip(self))]
    pub async fn release(
        &self,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<(), FulfillmentError> {
        if self.products.increment(product_id, quantity).await? {
            metrics::counter!("stock_releases_total").increment(1);
            tracing::debug!(%product_id, quantity, "stock released");
            Ok(())
        } else {
            Err(FulfillmentError::ProductNotFound(product_id.clone()))
        }
    }

    /// Reads a product snapshot without reserving anything.
    pub async fn peek(&self, product_id: &ProductId) -> Result<Product, FulfillmentError> {
        self.products
            .get(product_id)
            .await?
            .ok_or_else(|| FulfillmentError::ProductNotFound(product_id.clone()))
    }
}
