//! Shared identifier types used across the fulfillment core.

mod types;

pub use types::{AgentId, OrderId, ProductId};
