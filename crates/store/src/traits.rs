use async_trait::async_trait;
use common::{AgentId, OrderId, ProductId};
use domain::{Order, OrderStatus, Product};

use crate::Result;

/// Source of truth for product stock counters.
///
/// `conditional_decrement` is the only operation that can lower stock, and
/// implementations must evaluate its guard and apply the mutation as one
/// atomic step. Two concurrent decrements must never both pass a stale
/// check.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Reads a product. Returns `None` if it does not exist.
    async fn get(&self, product_id: &ProductId) -> Result<Option<Product>>;

    /// Decrements stock by `quantity` only if current stock >= `quantity`.
    ///
    /// Returns true if the decrement was applied, false if stock was
    /// insufficient or the product does not exist. Never leaves stock
    /// negative.
    async fn conditional_decrement(&self, product_id: &ProductId, quantity: u32) -> Result<bool>;

    /// Increments stock by `quantity`.
    ///
    /// Returns false if the product does not exist.
    async fn increment(&self, product_id: &ProductId, quantity: u32) -> Result<bool>;
}

/// Mutation applied to an order inside a conditional update.
pub type OrderMutator = Box<dyn FnOnce(&mut Order) + Send>;

/// Persistence contract for order records.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Reads an order. Returns `None` if it does not exist.
    async fn get(&self, order_id: OrderId) -> Result<Option<Order>>;

    /// Persists a new order.
    async fn insert(&self, order: Order) -> Result<Order>;

    /// Replaces an existing order record.
    async fn update(&self, order: Order) -> Result<Order>;

    /// Applies `mutate` to the order only if it currently has `expected`
    /// status, as one atomic step.
    ///
    /// Returns the updated order when the guard held, `None` when the order
    /// is missing or its status changed. Of N concurrent callers with the
    /// same guard, at most one observes `Some`.
    async fn update_if_status(
        &self,
        order_id: OrderId,
        expected: OrderStatus,
        mutate: OrderMutator,
    ) -> Result<Option<Order>>;

    /// Lists all orders, newest first.
    async fn list_all(&self) -> Result<Vec<Order>>;

    /// Lists orders with the given status, newest first.
    async fn list_by_status(&self, status: OrderStatus) -> Result<Vec<Order>>;

    /// Lists orders assigned to `agent_id` whose status is in `statuses`,
    /// newest first.
    async fn list_for_agent(&self, agent_id: &AgentId, statuses: &[OrderStatus])
    -> Result<Vec<Order>>;

    /// Counts orders with the given status.
    async fn count_by_status(&self, status: OrderStatus) -> Result<u64>;

    /// Removes an order. Returns true if it existed.
    async fn delete(&self, order_id: OrderId) -> Result<bool>;
}
