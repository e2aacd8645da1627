use common::OrderId;
use thiserror::Error;

/// Errors that can occur when interacting with a store.
///
/// These are unexpected faults (backend unreachable, integrity violations),
/// not business outcomes: a failed conditional update or a missing lookup is
/// reported through the operation's return value, not through this type.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An order with this ID already exists.
    #[error("duplicate order: {0}")]
    DuplicateOrder(OrderId),

    /// An update targeted an order that is no longer in the store.
    #[error("order vanished during update: {0}")]
    MissingOrder(OrderId),

    /// The backing store failed.
    #[error("store backend error: {0}")]
    Backend(String),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
