//! Order fulfillment orchestration.

use chrono::Utc;
use common::{AgentId, OrderId};
use domain::{AgentRef, CustomerInfo, Order, OrderLine, OrderPatch, OrderStatus};
use serde::{Deserialize, Serialize};
use store::{OrderStore, ProductStore};

use crate::{FulfillmentError, InventoryLedger, LowStockWarning, StockReservationService};

/// A requested order line: product reference plus quantity.
///
/// Name and price snapshots are taken from the catalog at creation time, so
/// callers only say what and how much.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineRequest {
    pub product_id: common::ProductId,
    pub quantity: u32,
}

/// An order-creation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrder {
    pub customer: CustomerInfo,
    pub lines: Vec<LineRequest>,
    pub delivery_address: String,
    pub notes: Option<String>,
}

/// A successfully created order plus any advisory low-stock warnings.
#[derive(Debug, Clone)]
pub struct CreatedOrder {
    pub order: Order,
    pub warnings: Vec<LowStockWarning>,
}

/// Per-status order counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderStats {
    pub available: u64,
    pub assigned: u64,
    pub in_transit: u64,
    pub delivered: u64,
    pub cancelled: u64,
    pub total: u64,
}

/// Orchestrates order creation, claiming, status progression, and
/// cancellation over the product and order stores.
///
/// Stateless apart from its store handles; safe to construct once per
/// replica and share.
pub struct OrderFulfillmentService<P, O> {
    orders: O,
    stock: StockReservationService<P>,
}

impl<P, O> OrderFulfillmentService<P, O>
where
    P: ProductStore,
    O: OrderStore,
{
    /// Creates a fulfillment service over the given stores.
    pub fn new(products: P, orders: O) -> Self {
        Self {
            orders,
            stock: StockReservationService::new(InventoryLedger::new(products)),
        }
    }

    /// Returns the stock reservation service.
    pub fn stock(&self) -> &StockReservationService<P> {
        &self.stock
    }

    /// Creates an order, reserving stock for every line.
    ///
    /// Snapshots product name and unit price per line, collects advisory
    /// low-stock warnings, then applies the all-or-nothing reservation. On
    /// reservation failure nothing is persisted and any partially applied
    /// lines have already been compensated.
    #[tracing::instrument(skip(self, request), fields(line_count = request.lines.len()))]
    pub async fn create_order(&self, request: NewOrder) -> Result<CreatedOrder, FulfillmentError> {
        let started = std::time::Instant::now();
        let now = Utc::now();

        if request.lines.is_empty() {
            return Err(domain::OrderError::EmptyLines.into());
        }

        let mut lines = Vec::with_capacity(request.lines.len());
        for line in &request.lines {
            if line.quantity == 0 {
                return Err(domain::OrderError::ZeroQuantity {
                    product_id: line.product_id.clone(),
                }
                .into());
            }
            let product = self.stock.ledger().peek(&line.product_id).await?;
            lines.push(OrderLine::new(
                product.id().clone(),
                product.name(),
                line.quantity,
                product.unit_price(),
            ));
        }

        let report = self.stock.validate(&lines).await?;
        self.stock.apply_all(&lines).await?;
        let reserved = lines.clone();

        let order = Order::new(
            request.customer,
            lines,
            request.delivery_address,
            request.notes,
            now,
        )?;

        let order = match self.orders.insert(order).await {
            Ok(order) => order,
            Err(err) => {
                // Stock is already reserved for this order; give it back
                // before surfacing the failure.
                if let Err(release_err) = self.stock.release_all(&reserved).await {
                    tracing::error!(error = %release_err, "stock release after failed insert failed");
                }
                return Err(err.into());
            }
        };

        metrics::counter!("orders_created_total").increment(1);
        metrics::histogram!("order_creation_duration_seconds")
            .record(started.elapsed().as_secs_f64());
        tracing::info!(
            order_id = %order.id(),
            total_cents = order.total().cents(),
            warnings = report.warnings().len(),
            "order created"
        );

        Ok(CreatedOrder {
            order,
            warnings: report.into_warnings(),
        })
    }

    /// Claims a DISPONIBLE order for an agent.
    ///
    /// The transition is a single conditional store operation guarded by
    /// `status == DISPONIBLE`: of N concurrent claimants exactly one wins
    /// and the rest observe [`FulfillmentError::NotAvailable`].
    #[tracing::instrument(skip(self, agent), fields(agent_id = %agent.id))]
    pub async fn claim_order(
        &self,
        order_id: OrderId,
        agent: AgentRef,
    ) -> Result<Order, FulfillmentError> {
        if self.orders.get(order_id).await?.is_none() {
            return Err(FulfillmentError::OrderNotFound(order_id));
        }

        let now = Utc::now();
        let claimed = self
            .orders
            .update_if_status(
                order_id,
                OrderStatus::Available,
                Box::new(move |order| order.assign(agent, now)),
            )
            .await?;

        match claimed {
            Some(order) => {
                metrics::counter!("order_claims_total").increment(1);
                tracing::info!(order_id = %order.id(), "order claimed");
                Ok(order)
            }
            None => {
                // Normal concurrent outcome: someone else got there first.
                metrics::counter!("order_claim_conflicts_total").increment(1);
                Err(FulfillmentError::NotAvailable(order_id))
            }
        }
    }

    /// Applies an agent-driven status transition.
    ///
    /// The agent must be the assignee and the transition must be in the
    /// table: ASIGNADO → EN_CAMINO, ASIGNADO → DISPONIBLE (release),
    /// EN_CAMINO → ENTREGADO.
    #[tracing::instrument(skip(self))]
    pub async fn update_status(
        &self,
        order_id: OrderId,
        agent_id: &AgentId,
        new_status: OrderStatus,
    ) -> Result<Order, FulfillmentError> {
        let mut order = self
            .orders
            .get(order_id)
            .await?
            .ok_or(FulfillmentError::OrderNotFound(order_id))?;

        order.transition(new_status, agent_id, Utc::now())?;
        let order = self.orders.update(order).await?;

        if new_status == OrderStatus::Delivered {
            metrics::counter!("orders_delivered_total").increment(1);
        }
        tracing::info!(order_id = %order.id(), status = %order.status(), "order status updated");
        Ok(order)
    }

    /// Cancels a non-delivered order and releases its reserved stock.
    ///
    /// Idempotent: cancelling an already-cancelled order returns it
    /// unchanged without touching stock. The status is flipped through a
    /// conditional update before stock is released, so concurrent cancels
    /// (or a cancel racing a claim) release each order's stock at most once.
    #[tracing::instrument(skip(self))]
    pub async fn cancel_order(&self, order_id: OrderId) -> Result<Order, FulfillmentError> {
        loop {
            let order = self
                .orders
                .get(order_id)
                .await?
                .ok_or(FulfillmentError::OrderNotFound(order_id))?;

            match order.status() {
                OrderStatus::Delivered => {
                    return Err(FulfillmentError::AlreadyDelivered(order_id));
                }
                OrderStatus::Cancelled => return Ok(order),
                current => {
                    let now = Utc::now();
                    let cancelled = self
                        .orders
                        .update_if_status(
                            order_id,
                            current,
                            Box::new(move |order| order.cancel(now)),
                        )
                        .await?;

                    if let Some(cancelled) = cancelled {
                        self.stock.release_all(cancelled.lines()).await?;
                        metrics::counter!("orders_cancelled_total").increment(1);
                        tracing::info!(order_id = %order_id, "order cancelled, stock released");
                        return Ok(cancelled);
                    }
                    // Lost a race with a claim, release, or another cancel;
                    // re-read and decide again.
                }
            }
        }
    }

    /// Administrative edit of customer/delivery/notes fields and line
    /// replacement.
    ///
    /// Does not re-run stock reservation; replaced lines are taken as
    /// already reserved.
    #[tracing::instrument(skip(self, patch))]
    pub async fn update_order(
        &self,
        order_id: OrderId,
        patch: OrderPatch,
    ) -> Result<Order, FulfillmentError> {
        let mut order = self
            .orders
            .get(order_id)
            .await?
            .ok_or(FulfillmentError::OrderNotFound(order_id))?;

        order.apply_patch(patch, Utc::now())?;
        Ok(self.orders.update(order).await?)
    }

    /// Removes an order record. No stock interaction.
    #[tracing::instrument(skip(self))]
    pub async fn remove_order(&self, order_id: OrderId) -> Result<(), FulfillmentError> {
        if self.orders.delete(order_id).await? {
            Ok(())
        } else {
            Err(FulfillmentError::OrderNotFound(order_id))
        }
    }

    /// Loads an order by ID.
    pub async fn get_order(&self, order_id: OrderId) -> Result<Order, FulfillmentError> {
        self.orders
            .get(order_id)
            .await?
            .ok_or(FulfillmentError::OrderNotFound(order_id))
    }

    /// Lists every order, newest first.
    pub async fn list_orders(&self) -> Result<Vec<Order>, FulfillmentError> {
        Ok(self.orders.list_all().await?)
    }

    /// Lists orders with the given status, newest first.
    pub async fn list_by_status(&self, status: OrderStatus) -> Result<Vec<Order>, FulfillmentError> {
        Ok(self.orders.list_by_status(status).await?)
    }

    /// Lists DISPONIBLE orders for agents browsing the pool.
    pub async fn available_orders(&self) -> Result<Vec<Order>, FulfillmentError> {
        self.list_by_status(OrderStatus::Available).await
    }

    /// Lists an agent's active deliveries (ASIGNADO and EN_CAMINO).
    pub async fn active_deliveries(
        &self,
        agent_id: &AgentId,
    ) -> Result<Vec<Order>, FulfillmentError> {
        Ok(self
            .orders
            .list_for_agent(agent_id, &[OrderStatus::Assigned, OrderStatus::InTransit])
            .await?)
    }

    /// Per-status order counts.
    pub async fn stats(&self) -> Result<OrderStats, FulfillmentError> {
        let mut stats = OrderStats::default();
        for status in OrderStatus::all() {
            let count = self.orders.count_by_status(status).await?;
            match status {
                OrderStatus::Available => stats.available = count,
                OrderStatus::Assigned => stats.assigned = count,
                OrderStatus::InTransit => stats.in_transit = count,
                OrderStatus::Delivered => stats.delivered = count,
                OrderStatus::Cancelled => stats.cancelled = count,
            }
            stats.total += count;
        }
        Ok(stats)
    }
}
