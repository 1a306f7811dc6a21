//! The simulation driver: the daily event loop tying calendar, universe,
//! allocation, sizing, execution and the ledger together.
//!
//! Each trading day follows a fixed sequence: mark open positions to the
//! latest close, then (on rebalance days past the burn-in) request target
//! weights, size the delta orders and execute them. One equity snapshot
//! is emitted per trading day, gap-free, so the curve is directly
//! consumable by statistics tooling.

use chrono::NaiveDate;
use std::collections::BTreeMap;

use super::broker::{RejectedOrder, SimulatedBroker};
use super::error::PortsimError;
use super::ledger::{EquitySnapshot, Ledger};
use super::schedule::{RebalanceRule, RebalanceSchedule, next_trading_day};
use super::sizer::OrderSizer;
use super::universe::Universe;
use crate::ports::allocation_port::AllocationPort;
use crate::ports::price_port::PricePort;

#[derive(Debug, Clone, Copy)]
pub struct SimulationConfig {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub initial_cash: f64,
    pub rebalance: RebalanceRule,
    /// Trading is suppressed on rebalance days before this date; marking
    /// and the equity curve still run from `start_date`.
    pub burn_in: Option<NaiveDate>,
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<(), PortsimError> {
        if self.end_date < self.start_date {
            return Err(PortsimError::config(format!(
                "end date {} precedes start date {}",
                self.end_date, self.start_date
            )));
        }
        if !(self.initial_cash > 0.0) {
            return Err(PortsimError::config(format!(
                "initial cash {} must be positive",
                self.initial_cash
            )));
        }
        if let Some(burn_in) = self.burn_in {
            if burn_in < self.start_date || burn_in > self.end_date {
                return Err(PortsimError::config(format!(
                    "burn-in date {burn_in} outside simulation range"
                )));
            }
        }
        Ok(())
    }
}

/// Everything a finished run produces.
#[derive(Debug)]
pub struct SimulationResult {
    /// One snapshot per trading day, ascending.
    pub equity_curve: Vec<EquitySnapshot>,
    pub rejections: Vec<RejectedOrder>,
    /// Scalar run statistics keyed by name.
    pub summary: BTreeMap<String, f64>,
    pub ledger: Ledger,
}

pub struct Simulation {
    config: SimulationConfig,
    universe: Universe,
    schedule: RebalanceSchedule,
    sizer: OrderSizer,
    broker: SimulatedBroker,
    allocation: Box<dyn AllocationPort>,
    prices: Box<dyn PricePort>,
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation").finish_non_exhaustive()
    }
}

impl Simulation {
    pub fn new(
        config: SimulationConfig,
        universe: Universe,
        sizer: OrderSizer,
        broker: SimulatedBroker,
        allocation: Box<dyn AllocationPort>,
        prices: Box<dyn PricePort>,
    ) -> Result<Self, PortsimError> {
        config.validate()?;
        let schedule =
            RebalanceSchedule::generate(config.rebalance, config.start_date, config.end_date)?;
        Ok(Simulation {
            config,
            universe,
            schedule,
            sizer,
            broker,
            allocation,
            prices,
        })
    }

    /// Run the full simulation and verify the ledger reconciles against a
    /// replay of its own transaction history before returning.
    pub fn run(mut self) -> Result<SimulationResult, PortsimError> {
        let start = next_trading_day(self.config.start_date);
        let mut ledger = Ledger::new(start, self.config.initial_cash);
        let mut equity_curve = Vec::new();
        let mut rejections = Vec::new();
        let mut peak_equity = self.config.initial_cash;
        let mut max_drawdown_pct = 0.0f64;

        for date in super::schedule::trading_days(start, self.config.end_date) {
            self.mark_positions(&mut ledger, date)?;

            if self.schedule.is_rebalance_day(date) && self.past_burn_in(date) {
                let report = self.rebalance(&mut ledger, date)?;
                rejections.extend(report);
            }

            let snapshot = ledger.snapshot(date);
            if snapshot.total_equity > peak_equity {
                peak_equity = snapshot.total_equity;
            } else if peak_equity > 0.0 {
                let dd = (peak_equity - snapshot.total_equity) / peak_equity * 100.0;
                max_drawdown_pct = max_drawdown_pct.max(dd);
            }
            equity_curve.push(snapshot);
        }

        if !ledger.reconciles()? {
            return Err(PortsimError::Ledger {
                reason: "transaction replay does not reproduce final cash and positions".into(),
            });
        }

        let summary = summarize(&ledger, &equity_curve, &rejections, max_drawdown_pct);
        Ok(SimulationResult {
            equity_curve,
            rejections,
            summary,
            ledger,
        })
    }

    fn past_burn_in(&self, date: NaiveDate) -> bool {
        self.config.burn_in.is_none_or(|b| date >= b)
    }

    /// Mark every open position to its latest known close. A held asset
    /// with no price at all by `date` is fatal: its valuation would
    /// silently go stale otherwise.
    fn mark_positions(&self, ledger: &mut Ledger, date: NaiveDate) -> Result<(), PortsimError> {
        for asset in ledger.held_assets() {
            let price = self.prices.latest_price(&asset, date)?;
            ledger.mark_position(&asset, price, date)?;
        }
        Ok(())
    }

    fn rebalance(
        &mut self,
        ledger: &mut Ledger,
        date: NaiveDate,
    ) -> Result<Vec<RejectedOrder>, PortsimError> {
        let eligible = self.universe.members_at(date);
        let weights = self
            .allocation
            .allocate(date, &eligible, &ledger.snapshot(date))?;

        for asset in weights.keys() {
            if !self.universe.contains_at(asset, date) {
                return Err(PortsimError::UniverseInconsistency {
                    asset: asset.clone(),
                    date,
                });
            }
        }

        let orders = self
            .sizer
            .size_orders(date, &weights, ledger, self.prices.as_ref())?;
        let report = self
            .broker
            .execute(date, orders, ledger, self.prices.as_ref())?;
        Ok(report.rejections)
    }
}

fn summarize(
    ledger: &Ledger,
    equity_curve: &[EquitySnapshot],
    rejections: &[RejectedOrder],
    max_drawdown_pct: f64,
) -> BTreeMap<String, f64> {
    let final_equity = equity_curve.last().map_or(ledger.initial_cash, |s| s.total_equity);
    let mut summary = BTreeMap::new();
    summary.insert("initial_cash".into(), ledger.initial_cash);
    summary.insert("final_cash".into(), ledger.cash);
    summary.insert("final_equity".into(), final_equity);
    summary.insert(
        "total_return_pct".into(),
        (final_equity / ledger.initial_cash - 1.0) * 100.0,
    );
    summary.insert("max_drawdown_pct".into(), max_drawdown_pct);
    summary.insert("num_trading_days".into(), equity_curve.len() as f64);
    summary.insert("num_transactions".into(), ledger.transactions().len() as f64);
    summary.insert("num_rejected_orders".into(), rejections.len() as f64);
    summary
}
