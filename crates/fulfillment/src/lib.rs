//! Order fulfillment and inventory-consistency core.
//!
//! Creating an order reserves stock from a shared inventory, orders flow
//! through a delivery-assignment state machine operated by concurrent
//! agents, and cancellation precisely reverses inventory effects.
//!
//! Two invariants are enforced at the store boundary rather than by
//! in-process locking, so the service can run as multiple replicas against
//! one backing store:
//! 1. stock never goes negative (conditional decrement in the ledger), and
//! 2. an order is claimed by at most one agent (conditional status
//!    transition in the fulfillment service).
//!
//! Multi-line reservation is the one multi-step protocol: lines are reserved
//! sequentially and compensated in reverse order if a later line fails, so a
//! partially-reserved order is never left behind.

mod error;
mod ledger;
mod reservation;
mod service;

pub use error::FulfillmentError;
pub use ledger::InventoryLedger;
pub use reservation::{LowStockWarning, StockReservationService, ValidationReport};
pub use service::{
    CreatedOrder, LineRequest, NewOrder, OrderFulfillmentService, OrderStats,
};
