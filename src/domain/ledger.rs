//! The portfolio ledger: cash, positions and the transaction history.
//!
//! The ledger is the single source of truth queried by order sizing and
//! by the statistics boundary. Cash and positions mutate only together,
//! atomically, per broker fill, and the full state can be reproduced by
//! replaying the transaction history from an empty ledger.

use chrono::NaiveDate;
use std::collections::BTreeMap;

use super::error::PortsimError;
use super::position::Position;
use super::transaction::Transaction;

/// One equity-curve entry: emitted once per trading day, gap-free and
/// ordered by date.
#[derive(Debug, Clone, PartialEq)]
pub struct EquitySnapshot {
    pub date: NaiveDate,
    pub cash: f64,
    pub total_equity: f64,
    /// Signed market value per open position.
    pub position_values: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ledger {
    pub cash: f64,
    pub initial_cash: f64,
    start_date: NaiveDate,
    current_date: NaiveDate,
    positions: BTreeMap<String, Position>,
    transactions: Vec<Transaction>,
}

impl Ledger {
    pub fn new(start_date: NaiveDate, initial_cash: f64) -> Self {
        Ledger {
            cash: initial_cash,
            initial_cash,
            start_date,
            current_date: start_date,
            positions: BTreeMap::new(),
            transactions: Vec::new(),
        }
    }

    pub fn position(&self, asset: &str) -> Option<&Position> {
        self.positions.get(asset)
    }

    /// Open positions in deterministic (symbol) order.
    pub fn positions(&self) -> impl Iterator<Item = &Position> {
        self.positions.values()
    }

    pub fn quantity(&self, asset: &str) -> f64 {
        self.positions.get(asset).map_or(0.0, |p| p.quantity)
    }

    pub fn held_assets(&self) -> Vec<String> {
        self.positions.keys().cloned().collect()
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn current_date(&self) -> NaiveDate {
        self.current_date
    }

    /// Apply a fill atomically: position first, then cash, then the
    /// history record. A position whose quantity returns to zero is
    /// removed from the ledger.
    pub fn apply_transaction(&mut self, txn: Transaction) -> Result<(), PortsimError> {
        if txn.date < self.current_date {
            return Err(PortsimError::Ledger {
                reason: format!(
                    "transaction date {} precedes ledger date {}",
                    txn.date, self.current_date
                ),
            });
        }

        match self.positions.get_mut(&txn.asset) {
            Some(pos) => {
                pos.apply(&txn)?;
                if pos.quantity == 0.0 {
                    self.positions.remove(&txn.asset);
                }
            }
            None => {
                let pos = Position::open_from_transaction(&txn)?;
                self.positions.insert(txn.asset.clone(), pos);
            }
        }

        self.cash += txn.cash_effect();
        self.current_date = txn.date;
        self.transactions.push(txn);
        Ok(())
    }

    /// Record a daily mark for an open position.
    pub fn mark_position(
        &mut self,
        asset: &str,
        price: f64,
        date: NaiveDate,
    ) -> Result<(), PortsimError> {
        if let Some(pos) = self.positions.get_mut(asset) {
            pos.mark(price, date)?;
        }
        self.current_date = self.current_date.max(date);
        Ok(())
    }

    /// Sum of signed position values at their latest marks.
    pub fn total_market_value(&self) -> f64 {
        self.positions
            .values()
            .map(|p| p.market_value(p.last_price))
            .sum()
    }

    /// Point-in-time total equity: cash plus marked position values.
    pub fn total_equity(&self) -> f64 {
        self.cash + self.total_market_value()
    }

    pub fn snapshot(&self, date: NaiveDate) -> EquitySnapshot {
        let position_values = self
            .positions
            .iter()
            .map(|(asset, pos)| (asset.clone(), pos.market_value(pos.last_price)))
            .collect();
        EquitySnapshot {
            date,
            cash: self.cash,
            total_equity: self.total_equity(),
            position_values,
        }
    }

    /// Rebuild a ledger from this one's transaction history. Used as a
    /// reconciliation oracle: the replayed cash and position quantities
    /// must match the live ledger exactly.
    pub fn replay(&self) -> Result<Ledger, PortsimError> {
        let mut fresh = Ledger::new(self.start_date, self.initial_cash);
        for txn in &self.transactions {
            fresh.apply_transaction(txn.clone())?;
        }
        Ok(fresh)
    }

    /// Check that replaying the history reproduces cash and positions
    /// within floating-point tolerance.
    pub fn reconciles(&self) -> Result<bool, PortsimError> {
        let replayed = self.replay()?;
        if (replayed.cash - self.cash).abs() > 1e-6 {
            return Ok(false);
        }
        if replayed.positions.len() != self.positions.len() {
            return Ok(false);
        }
        for (asset, pos) in &self.positions {
            match replayed.positions.get(asset) {
                Some(r) if (r.quantity - pos.quantity).abs() <= 1e-9 => {}
                _ => return Ok(false),
            }
        }
        Ok(true)
    }
}
