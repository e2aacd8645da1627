//! Domain model for the fulfillment core.
//!
//! Contains the order record with its status state machine, the product
//! entity owned by the inventory ledger, and the value objects shared by
//! both. Stock mutation and status orchestration live in the `fulfillment`
//! crate; this crate only encodes what a valid order and a valid transition
//! look like.

mod error;
mod order;
mod product;
mod status;
mod value_objects;

pub use error::OrderError;
pub use order::{AgentRef, CustomerInfo, Order, OrderPatch};
pub use product::Product;
pub use status::OrderStatus;
pub use value_objects::{Money, OrderLine};

pub use common::{AgentId, OrderId, ProductId};
