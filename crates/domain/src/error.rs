//! Domain error types.

use common::{AgentId, ProductId};
use thiserror::Error;

use crate::OrderStatus;

/// Errors raised by the order record itself.
#[derive(Debug, Error)]
pub enum OrderError {
    /// The requested status change is not in the transition table.
    #[error("invalid status transition from {from} to {to}")]
    InvalidTransition {
        from: OrderStatus,
        to: OrderStatus,
    },

    /// A status update was attempted by an agent other than the assignee.
    #[error("agent {agent_id} is not assigned to this order")]
    Unauthorized { agent_id: AgentId },

    /// An order must contain at least one line.
    #[error("order must contain at least one line")]
    EmptyLines,

    /// Line quantities must be positive.
    #[error("quantity must be greater than zero for product {product_id}")]
    ZeroQuantity { product_id: ProductId },
}
