//! Simulated broker: fills market orders against the price source and
//! posts the resulting transactions to the ledger.
//!
//! Fills are all-or-nothing. An order the cash floor cannot support is
//! either rejected (the default) or aborts the run, per policy; it is
//! never partially filled. A fill that would carry a position through
//! zero is split into a closing leg and an opening leg so the ledger
//! only ever sees single-sided position changes.

use chrono::NaiveDate;

use super::error::PortsimError;
use super::fees::{FeeModel, SlippageModel};
use super::ledger::Ledger;
use super::order::Order;
use super::transaction::Transaction;
use crate::ports::price_port::{PriceField, PricePort};

/// What to do with an order the cash floor cannot support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InsufficientCashPolicy {
    /// Reject the order, record it, and continue with the rest of the
    /// batch.
    #[default]
    Reject,
    /// Treat it as fatal and abort the run.
    Abort,
}

#[derive(Debug, Clone, Copy)]
pub struct BrokerConfig {
    /// Cash is never allowed below this level by a fill.
    pub min_cash: f64,
    /// Permit fills that take cash below the floor (margin trading).
    pub allow_margin: bool,
    pub policy: InsufficientCashPolicy,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        BrokerConfig {
            min_cash: 0.0,
            allow_margin: false,
            policy: InsufficientCashPolicy::default(),
        }
    }
}

/// Record of an order turned away at the cash floor.
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedOrder {
    pub order_id: u64,
    pub date: NaiveDate,
    pub asset: String,
    pub quantity: f64,
    pub required: f64,
    pub available: f64,
}

/// Outcome of one execution batch.
#[derive(Debug, Default)]
pub struct ExecutionReport {
    /// Every order of the batch in its terminal state.
    pub orders: Vec<Order>,
    pub rejections: Vec<RejectedOrder>,
}

pub struct SimulatedBroker {
    config: BrokerConfig,
    fee_model: Box<dyn FeeModel>,
    slippage_model: Box<dyn SlippageModel>,
}

impl SimulatedBroker {
    pub fn new(
        config: BrokerConfig,
        fee_model: Box<dyn FeeModel>,
        slippage_model: Box<dyn SlippageModel>,
    ) -> Self {
        SimulatedBroker {
            config,
            fee_model,
            slippage_model,
        }
    }

    /// Execute a batch of orders in the order given. A missing price for
    /// any order's asset is fatal; a cash-floor breach follows the
    /// configured policy.
    pub fn execute(
        &self,
        date: NaiveDate,
        orders: Vec<Order>,
        ledger: &mut Ledger,
        prices: &dyn PricePort,
    ) -> Result<ExecutionReport, PortsimError> {
        let mut report = ExecutionReport::default();

        for mut order in orders {
            order.submit()?;

            let market_price = prices.price(&order.asset, date, PriceField::Close)?;
            let fill_price = self
                .slippage_model
                .fill_price(&order.asset, order.quantity, market_price);
            let consideration = order.quantity * fill_price;
            let commission = self
                .fee_model
                .commission(&order.asset, order.quantity, consideration);
            let cash_after = ledger.cash - consideration - commission;

            if cash_after < self.config.min_cash && !self.config.allow_margin {
                let required = consideration + commission;
                let available = ledger.cash - self.config.min_cash;
                match self.config.policy {
                    InsufficientCashPolicy::Reject => {
                        order.reject()?;
                        report.rejections.push(RejectedOrder {
                            order_id: order.id,
                            date,
                            asset: order.asset.clone(),
                            quantity: order.quantity,
                            required,
                            available,
                        });
                        report.orders.push(order);
                        continue;
                    }
                    InsufficientCashPolicy::Abort => {
                        return Err(PortsimError::OrderInfeasible {
                            asset: order.asset,
                            date,
                            required,
                            available,
                        });
                    }
                }
            }

            for txn in split_fill(&order, fill_price, commission, ledger) {
                ledger.apply_transaction(txn)?;
            }
            order.fill()?;
            report.orders.push(order);
        }

        Ok(report)
    }
}

/// Turn a filled order into ledger transactions. A fill whose delta
/// carries the existing position through zero becomes two transactions
/// sharing the order id: one closing the full open quantity, one opening
/// the remainder on the other side. Commission is split pro-rata by
/// quantity.
fn split_fill(order: &Order, fill_price: f64, commission: f64, ledger: &Ledger) -> Vec<Transaction> {
    let held = ledger.quantity(&order.asset);
    let after = held + order.quantity;

    let crosses_zero = held != 0.0 && after != 0.0 && (held > 0.0) != (after > 0.0);
    if !crosses_zero {
        return vec![Transaction {
            asset: order.asset.clone(),
            quantity: order.quantity,
            price: fill_price,
            commission,
            date: order.date,
            order_id: order.id,
        }];
    }

    let closing_qty = -held;
    let opening_qty = after;
    let total = order.quantity.abs();
    let closing_commission = commission * closing_qty.abs() / total;
    let opening_commission = commission - closing_commission;
    vec![
        Transaction {
            asset: order.asset.clone(),
            quantity: closing_qty,
            price: fill_price,
            commission: closing_commission,
            date: order.date,
            order_id: order.id,
        },
        Transaction {
            asset: order.asset.clone(),
            quantity: opening_qty,
            price: fill_price,
            commission: opening_commission,
            date: order.date,
            order_id: order.id,
        },
    ]
}
