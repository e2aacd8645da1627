//! Store contracts consumed by the fulfillment core.
//!
//! The core never assumes in-process mutual exclusion: the invariants that
//! matter under concurrency (stock never negative, one claimant per order)
//! are enforced by the conditional operations on these traits, which every
//! backend must implement as a single atomic check-and-mutate. The in-memory
//! implementations here do so under one write-lock acquisition and double as
//! the test backend.

mod error;
mod memory;
mod traits;

pub use error::{Result, StoreError};
pub use memory::{InMemoryOrderStore, InMemoryProductStore};
pub use traits::{OrderMutator, OrderStore, ProductStore};
