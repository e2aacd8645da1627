//! Order status state machine.

use serde::{Deserialize, Serialize};

/// The status of an order in its delivery lifecycle.
///
/// Transitions:
/// ```text
/// DISPONIBLE <──► ASIGNADO ──► EN_CAMINO ──► ENTREGADO
///     │               │            │
///     └───────────────┴────────────┴──► CANCELADO
/// ```
///
/// The serialized names are the Spanish wire names existing clients expect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderStatus {
    /// Order created, stock reserved, waiting to be claimed by an agent.
    #[default]
    #[serde(rename = "DISPONIBLE")]
    Available,

    /// Order claimed by exactly one agent.
    #[serde(rename = "ASIGNADO")]
    Assigned,

    /// The assigned agent is en route.
    #[serde(rename = "EN_CAMINO")]
    InTransit,

    /// Order delivered (terminal state).
    #[serde(rename = "ENTREGADO")]
    Delivered,

    /// Order cancelled by an administrator (terminal state).
    #[serde(rename = "CANCELADO")]
    Cancelled,
}

impl OrderStatus {
    /// Returns true if an agent can claim the order in this status.
    pub fn can_claim(&self) -> bool {
        matches!(self, OrderStatus::Available)
    }

    /// Returns true if the order can be cancelled in this status.
    pub fn can_cancel(&self) -> bool {
        matches!(
            self,
            OrderStatus::Available | OrderStatus::Assigned | OrderStatus::InTransit
        )
    }

    /// Returns true if this is a terminal status (no further transitions possible).
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Returns true if the assigned agent may move the order from this status
    /// to `next`.
    ///
    /// This is the agent-side transition table; claiming (DISPONIBLE →
    /// ASIGNADO) and cancellation are separate administrator/claimant paths.
    pub fn agent_transition_allowed(&self, next: OrderStatus) -> bool {
        matches!(
            (self, next),
            (OrderStatus::Assigned, OrderStatus::InTransit)
                | (OrderStatus::Assigned, OrderStatus::Available)
                | (OrderStatus::InTransit, OrderStatus::Delivered)
        )
    }

    /// Returns the status name in the wire format.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Available => "DISPONIBLE",
            OrderStatus::Assigned => "ASIGNADO",
            OrderStatus::InTransit => "EN_CAMINO",
            OrderStatus::Delivered => "ENTREGADO",
            OrderStatus::Cancelled => "CANCELADO",
        }
    }

    /// All statuses, in lifecycle order.
    pub fn all() -> [OrderStatus; 5] {
        [
            OrderStatus::Available,
            OrderStatus::Assigned,
            OrderStatus::InTransit,
            OrderStatus::Delivered,
            OrderStatus::Cancelled,
        ]
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
