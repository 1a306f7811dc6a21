//! Market orders and their lifecycle.
//!
//! An order moves `Created -> Submitted -> {Filled, Rejected}`. Both end
//! states are terminal: a rejected order is never regenerated within the
//! same rebalance cycle.

use chrono::NaiveDate;

use super::error::PortsimError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    Created,
    Submitted,
    Filled,
    Rejected,
}

/// A signed-quantity market order produced by the order sizer and
/// consumed exactly once by the broker.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub id: u64,
    pub asset: String,
    /// Signed quantity delta: positive = buy, negative = sell.
    pub quantity: f64,
    pub date: NaiveDate,
    pub status: OrderStatus,
}

impl Order {
    pub fn new(id: u64, asset: impl Into<String>, quantity: f64, date: NaiveDate) -> Self {
        Order {
            id,
            asset: asset.into(),
            quantity,
            date,
            status: OrderStatus::Created,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.status, OrderStatus::Filled | OrderStatus::Rejected)
    }

    pub fn submit(&mut self) -> Result<(), PortsimError> {
        self.transition(OrderStatus::Created, OrderStatus::Submitted)
    }

    pub fn fill(&mut self) -> Result<(), PortsimError> {
        self.transition(OrderStatus::Submitted, OrderStatus::Filled)
    }

    pub fn reject(&mut self) -> Result<(), PortsimError> {
        self.transition(OrderStatus::Submitted, OrderStatus::Rejected)
    }

    fn transition(&mut self, from: OrderStatus, to: OrderStatus) -> Result<(), PortsimError> {
        if self.status != from {
            return Err(PortsimError::Ledger {
                reason: format!(
                    "invalid order {} transition {:?} -> {:?}",
                    self.id, self.status, to
                ),
            });
        }
        self.status = to;
        Ok(())
    }
}
