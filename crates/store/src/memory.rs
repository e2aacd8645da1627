use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::{AgentId, OrderId, ProductId};
use domain::{Order, OrderStatus, Product};
use tokio::sync::RwLock;

use crate::{OrderMutator, OrderStore, ProductStore, Result, StoreError};

/// In-memory product store.
///
/// Holds the product map behind a single `RwLock`; the conditional decrement
/// runs entirely under one write-lock acquisition, which gives it the same
/// atomicity a database conditional update would provide.
#[derive(Clone, Default)]
pub struct InMemoryProductStore {
    products: Arc<RwLock<HashMap<ProductId, Product>>>,
}

impl InMemoryProductStore {
    /// Creates a new empty product store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a product. Seeding helper for tests and demos;
    /// catalog management is outside the fulfillment core.
    pub async fn put(&self, product: Product) {
        self.products
            .write()
            .await
            .insert(product.id().clone(), product);
    }

    /// Returns the number of products stored.
    pub async fn product_count(&self) -> usize {
        self.products.read().await.len()
    }
}

#[async_trait]
impl ProductStore for InMemoryProductStore {
    async fn get(&self, product_id: &ProductId) -> Result<Option<Product>> {
        Ok(self.products.read().await.get(product_id).cloned())
    }

    async fn conditional_decrement(&self, product_id: &ProductId, quantity: u32) -> Result<bool> {
        let mut products = self.products.write().await;
        Ok(products
            .get_mut(product_id)
            .is_some_and(|product| product.try_decrement(quantity)))
    }

    async fn increment(&self, product_id: &ProductId, quantity: u32) -> Result<bool> {
        let mut products = self.products.write().await;
        match products.get_mut(product_id) {
            Some(product) => {
                product.increment(quantity);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

/// In-memory order store.
#[derive(Clone, Default)]
pub struct InMemoryOrderStore {
    orders: Arc<RwLock<HashMap<OrderId, Order>>>,
}

impl InMemoryOrderStore {
    /// Creates a new empty order store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of orders stored.
    pub async fn order_count(&self) -> usize {
        self.orders.read().await.len()
    }
}

fn sorted_newest_first(mut orders: Vec<Order>) -> Vec<Order> {
    orders.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
    orders
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn get(&self, order_id: OrderId) -> Result<Option<Order>> {
        Ok(self.orders.read().await.get(&order_id).cloned())
    }

    async fn insert(&self, order: Order) -> Result<Order> {
        let mut orders = self.orders.write().await;
        if orders.contains_key(&order.id()) {
            return Err(StoreError::DuplicateOrder(order.id()));
        }
        orders.insert(order.id(), order.clone());
        Ok(order)
    }

    async fn update(&self, order: Order) -> Result<Order> {
        let mut orders = self.orders.write().await;
        if !orders.contains_key(&order.id()) {
            return Err(StoreError::MissingOrder(order.id()));
        }
        orders.insert(order.id(), order.clone());
        Ok(order)
    }

    async fn update_if_status(
        &self,
        order_id: OrderId,
        expected: OrderStatus,
        mutate: OrderMutator,
    ) -> Result<Option<Order>> {
        let mut orders = self.orders.write().await;
        match orders.get_mut(&order_id) {
            Some(order) if order.status() == expected => {
                mutate(order);
                Ok(Some(order.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn list_all(&self) -> Result<Vec<Order>> {
        let orders = self.orders.read().await;
        Ok(sorted_newest_first(orders.values().cloned().collect()))
    }

    async fn list_by_status(&self, status: OrderStatus) -> Result<Vec<Order>> {
        let orders = self.orders.read().await;
        Ok(sorted_newest_first(
            orders
                .values()
                .filter(|order| order.status() == status)
                .cloned()
                .collect(),
        ))
    }

    async fn list_for_agent(
        &self,
        agent_id: &AgentId,
        statuses: &[OrderStatus],
    ) -> Result<Vec<Order>> {
        let orders = self.orders.read().await;
        Ok(sorted_newest_first(
            orders
                .values()
                .filter(|order| {
                    statuses.contains(&order.status())
                        && order
                            .assigned_agent()
                            .is_some_and(|agent| &agent.id == agent_id)
                })
                .cloned()
                .collect(),
        ))
    }

    async fn count_by_status(&self, status: OrderStatus) -> Result<u64> {
        let orders = self.orders.read().await;
        Ok(orders
            .values()
            .filter(|order| order.status() == status)
            .count() as u64)
    }

    async fn delete(&self, order_id: OrderId) -> Result<bool> {
        Ok(self.orders.write().await.remove(&order_id).is_some())
    }
}
