//! Fulfillment error taxonomy.

use common::{OrderId, ProductId};
use domain::OrderError;
use store::StoreError;
use thiserror::Error;

/// Errors surfaced by the fulfillment core.
///
/// `NotAvailable` is a normal concurrent outcome (a claim race lost), not an
/// exceptional condition; retrying against a different order is the caller's
/// decision. Low-stock conditions are warnings returned alongside success,
/// never errors.
#[derive(Debug, Error)]
pub enum FulfillmentError {
    /// The referenced product does not exist.
    #[error("product not found: {0}")]
    ProductNotFound(ProductId),

    /// Stock could not cover the requested quantity. Fatal to order
    /// creation; no partial order is persisted.
    #[error(
        "insufficient stock for product {product_id}: available {available}, requested {requested}"
    )]
    InsufficientStock {
        product_id: ProductId,
        available: u32,
        requested: u32,
    },

    /// The referenced order does not exist.
    #[error("order not found: {0}")]
    OrderNotFound(OrderId),

    /// The order was not in DISPONIBLE when the claim landed.
    #[error("order {0} is not available to claim")]
    NotAvailable(OrderId),

    /// Delivered orders cannot be cancelled.
    #[error("order {0} has already been delivered")]
    AlreadyDelivered(OrderId),

    /// A domain rule was violated (invalid transition, unauthorized agent,
    /// malformed lines).
    #[error(transparent)]
    Order(#[from] OrderError),

    /// The backing store failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}
