//! Multi-line stock reservation with compensating rollback.

use common::ProductId;
use domain::OrderLine;
use serde::{Deserialize, Serialize};
use store::ProductStore;

use crate::{FulfillmentError, InventoryLedger};

/// Advisory warning that a reservation would leave a product below its
/// reorder threshold. Informational only; it never blocks order creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LowStockWarning {
    pub product_id: ProductId,
    pub product_name: String,
    pub current_stock: u32,
    pub min_stock: u32,
    pub requested_quantity: u32,
    /// May be negative: validation is advisory even when stock cannot cover
    /// the request; blocking happens in the reservation step.
    pub resulting_stock: i64,
}

/// Outcome of validating an order's lines against current stock levels.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationReport {
    warnings: Vec<LowStockWarning>,
}

impl ValidationReport {
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn warnings(&self) -> &[LowStockWarning] {
        &self.warnings
    }

    pub fn into_warnings(self) -> Vec<LowStockWarning> {
        self.warnings
    }

    fn push(&mut self, warning: LowStockWarning) {
        self.warnings.push(warning);
    }
}

/// Applies all-or-nothing stock reservations for an order's lines.
///
/// Reservation runs as a saga: lines are reserved in order, and if line k+1
/// fails, lines 1..k are released in reverse order before the failure is
/// surfaced, so callers never observe partial stock depletion.
pub struct StockReservationService<S> {
    ledger: InventoryLedger<S>,
}

impl<S: ProductStore> StockReservationService<S> {
    /// Creates a reservation service over the given ledger.
    pub fn new(ledger: InventoryLedger<S>) -> Self {
        Self { ledger }
    }

    /// Returns the underlying ledger.
    pub fn ledger(&self) -> &InventoryLedger<S> {
        &self.ledger
    }

    /// Computes advisory low-stock warnings for the given lines.
    ///
    /// A warning is emitted when `stock - quantity < min_stock`. Nothing is
    /// reserved.
    #[tracing::instrument(skip(self, lines), fields(line_count = lines.len()))]
    pub async fn validate(
        &self,
        lines: &[OrderLine],
    ) -> Result<ValidationReport, FulfillmentError> {
        let mut report = ValidationReport::default();

        for line in lines {
            let product = self.ledger.peek(&line.product_id).await?;
            let resulting_stock = product.stock() as i64 - line.quantity as i64;
            if resulting_stock < product.min_stock() as i64 {
                tracing::warn!(
                    product_id = %line.product_id,
                    resulting_stock,
                    min_stock = product.min_stock(),
                    "order would leave product below min stock"
                );
                report.push(LowStockWarning {
                    product_id: line.product_id.clone(),
                    product_name: product.name().to_string(),
                    current_stock: product.stock(),
                    min_stock: product.min_stock(),
                    requested_quantity: line.quantity,
                    resulting_stock,
                });
            }
        }

        Ok(report)
    }

    /// Reserves every line's quantity, all-or-nothing.
    #[tracing::instrument(skip(self, lines), fields(line_count = lines.len()))]
    pub async fn apply_all(&self, lines: &[OrderLine]) -> Result<(), FulfillmentError> {
        let mut applied: Vec<&OrderLine> = Vec::with_capacity(lines.len());

        for line in lines {
            match self.ledger.reserve(&line.product_id, line.quantity).await {
                Ok(()) => applied.push(line),
                Err(err) => {
                    tracing::warn!(
                        product_id = %line.product_id,
                        error = %err,
                        applied = applied.len(),
                        "reservation aborted, compensating prior lines"
                    );
                    self.compensate(&applied).await;
                    metrics::counter!("stock_reservation_rollbacks_total").increment(1);
                    return Err(err);
                }
            }
        }

        Ok(())
    }

    /// Releases every line's quantity.
    ///
    /// Idempotency is the caller's responsibility; this does not track
    /// whether it already ran for a given order.
    #[tracing::instrument(skip(self, lines), fields(line_count = lines.len()))]
    pub async fn release_all(&self, lines: &[OrderLine]) -> Result<(), FulfillmentError> {
        for line in lines {
            self.ledger.release(&line.product_id, line.quantity).await?;
        }
        Ok(())
    }

    /// Releases already-reserved lines in reverse order.
    ///
    /// A failed release here cannot be compensated further; it is logged and
    /// the remaining lines are still released.
    async fn compensate(&self, applied: &[&OrderLine]) {
        for line in applied.iter().rev() {
            if let Err(err) = self.ledger.release(&line.product_id, line.quantity).await {
                tracing::error!(
                    product_id = %line.product_id,
                    quantity = line.quantity,
                    error = %err,
                    "compensating release failed"
                );
            }
        }
    }
}
