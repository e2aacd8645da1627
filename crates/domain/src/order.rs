//! The order record and its lifecycle transitions.

use chrono::{DateTime, Utc};
use common::{AgentId, OrderId};
use serde::{Deserialize, Serialize};

use crate::{Money, OrderError, OrderLine, OrderStatus};

/// Customer reference fields carried on an order.
///
/// Opaque to the fulfillment core; the client catalog owns these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerInfo {
    pub id: String,
    pub name: String,
    pub address: String,
    pub phone: String,
}

/// The agent an order is assigned to: id plus a display-name snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentRef {
    pub id: AgentId,
    pub name: String,
}

impl AgentRef {
    pub fn new(id: impl Into<AgentId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Administrative patch applied by `update_order`.
///
/// Fields left as `None` keep their current value. Replacing lines does not
/// re-run stock reservation; the new lines are taken as already reserved.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderPatch {
    pub customer: Option<CustomerInfo>,
    pub delivery_address: Option<String>,
    pub notes: Option<String>,
    pub lines: Option<Vec<OrderLine>>,
}

/// An order flowing through the delivery-assignment state machine.
///
/// The record owns its status transitions: every mutation goes through a
/// method that enforces the transition table, so an `Order` value can never
/// hold a status reached through an invalid path. Concurrency guards (one
/// claimant per order) are the fulfillment service's job, applied at the
/// store boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    customer: CustomerInfo,
    lines: Vec<OrderLine>,
    delivery_address: String,
    notes: Option<String>,
    status: OrderStatus,
    assigned_agent: Option<AgentRef>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    assigned_at: Option<DateTime<Utc>>,
    delivered_at: Option<DateTime<Utc>>,
    total: Money,
}

impl Order {
    /// Creates a new order in DISPONIBLE with a computed total.
    ///
    /// The caller is expected to have reserved stock for every line first.
    pub fn new(
        customer: CustomerInfo,
        lines: Vec<OrderLine>,
        delivery_address: impl Into<String>,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Self, OrderError> {
        validate_lines(&lines)?;
        let total = compute_total(&lines);

        Ok(Self {
            id: OrderId::new(),
            customer,
            lines,
            delivery_address: delivery_address.into(),
            notes,
            status: OrderStatus::Available,
            assigned_agent: None,
            created_at: now,
            updated_at: now,
            assigned_at: None,
            delivered_at: None,
            total,
        })
    }

    pub fn id(&self) -> OrderId {
        self.id
    }

    pub fn customer(&self) -> &CustomerInfo {
        &self.customer
    }

    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }

    pub fn delivery_address(&self) -> &str {
        &self.delivery_address
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn assigned_agent(&self) -> Option<&AgentRef> {
        self.assigned_agent.as_ref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn assigned_at(&self) -> Option<DateTime<Utc>> {
        self.assigned_at
    }

    pub fn delivered_at(&self) -> Option<DateTime<Utc>> {
        self.delivered_at
    }

    /// Sum of line subtotals, recomputed on every line change.
    pub fn total(&self) -> Money {
        self.total
    }

    /// Records a successful claim: DISPONIBLE → ASIGNADO.
    ///
    /// Called inside the store's conditional update, which has already
    /// checked the current status, so this only writes the side effects.
    pub fn assign(&mut self, agent: AgentRef, at: DateTime<Utc>) {
        self.status = OrderStatus::Assigned;
        self.assigned_agent = Some(agent);
        self.assigned_at = Some(at);
        self.updated_at = at;
    }

    /// Marks the order cancelled.
    ///
    /// Like [`assign`](Self::assign), guarded by the store's conditional
    /// update; stock release is the caller's responsibility.
    pub fn cancel(&mut self, at: DateTime<Utc>) {
        self.status = OrderStatus::Cancelled;
        self.updated_at = at;
    }

    /// Applies an agent-driven status transition.
    ///
    /// Verifies the agent is the assignee, then checks the transition table:
    /// ASIGNADO → EN_CAMINO, ASIGNADO → DISPONIBLE (release, clears the
    /// assignment), EN_CAMINO → ENTREGADO (stamps `delivered_at`).
    pub fn transition(
        &mut self,
        next: OrderStatus,
        agent_id: &AgentId,
        at: DateTime<Utc>,
    ) -> Result<(), OrderError> {
        let is_assignee = self
            .assigned_agent
            .as_ref()
            .is_some_and(|agent| &agent.id == agent_id);
        if !is_assignee {
            return Err(OrderError::Unauthorized {
                agent_id: agent_id.clone(),
            });
        }

        if !self.status.agent_transition_allowed(next) {
            return Err(OrderError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }

        match next {
            OrderStatus::Available => {
                // Releasing the claim puts the order back in the pool.
                self.assigned_agent = None;
                self.assigned_at = None;
            }
            OrderStatus::Delivered => {
                self.delivered_at = Some(at);
            }
            _ => {}
        }

        self.status = next;
        self.updated_at = at;
        Ok(())
    }

    /// Applies an administrative patch and recomputes the total.
    pub fn apply_patch(&mut self, patch: OrderPatch, at: DateTime<Utc>) -> Result<(), OrderError> {
        if let Some(lines) = patch.lines {
            validate_lines(&lines)?;
            self.total = compute_total(&lines);
            self.lines = lines;
        }
        if let Some(customer) = patch.customer {
            self.customer = customer;
        }
        if let Some(delivery_address) = patch.delivery_address {
            self.delivery_address = delivery_address;
        }
        if let Some(notes) = patch.notes {
            self.notes = Some(notes);
        }
        self.updated_at = at;
        Ok(())
    }
}

fn validate_lines(lines: &[OrderLine]) -> Result<(), OrderError> {
    if lines.is_empty() {
        return Err(OrderError::EmptyLines);
    }
    for line in lines {
        if line.quantity == 0 {
            return Err(OrderError::ZeroQuantity {
                product_id: line.product_id.clone(),
            });
        }
    }
    Ok(())
}

fn compute_total(lines: &[OrderLine]) -> Money {
    lines.iter().map(OrderLine::subtotal).sum()
}
