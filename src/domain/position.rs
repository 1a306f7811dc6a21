//! Position accounting: signed quantity, weighted-average cost basis and
//! realized P&L.
//!
//! A position is owned exclusively by one ledger and mutated only through
//! [`Position::apply`] while processing a broker fill. The broker splits
//! any fill that would cross through zero into a closing and an opening
//! leg, so a single transaction never changes the sign of a position.

use chrono::NaiveDate;

use super::error::PortsimError;
use super::transaction::Transaction;

#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub asset: String,
    /// Signed quantity: positive = long, negative = short.
    pub quantity: f64,
    /// Weighted-average entry price of the open quantity, commission
    /// excluded. Always non-negative.
    pub cost_basis: f64,
    /// P&L realized by reducing fills, net of their commission.
    pub realized_pnl: f64,
    /// Most recent mark known to the position.
    pub last_price: f64,
    pub last_date: NaiveDate,
}

impl Position {
    /// Open a fresh position from its first transaction.
    pub fn open_from_transaction(txn: &Transaction) -> Result<Self, PortsimError> {
        if txn.quantity == 0.0 {
            return Err(PortsimError::Ledger {
                reason: format!("cannot open position in {} from zero-quantity fill", txn.asset),
            });
        }
        Ok(Position {
            asset: txn.asset.clone(),
            quantity: txn.quantity,
            cost_basis: txn.price,
            realized_pnl: -txn.commission,
            last_price: txn.price,
            last_date: txn.date,
        })
    }

    pub fn is_long(&self) -> bool {
        self.quantity > 0.0
    }

    pub fn is_short(&self) -> bool {
        self.quantity < 0.0
    }

    /// 1 long, -1 short, 0 flat.
    pub fn direction(&self) -> i8 {
        if self.quantity > 0.0 {
            1
        } else if self.quantity < 0.0 {
            -1
        } else {
            0
        }
    }

    /// Signed market value at the given price.
    pub fn market_value(&self, price: f64) -> f64 {
        self.quantity * price
    }

    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        (price - self.cost_basis) * self.quantity
    }

    /// Record a new mark. Marks must not move backwards in time and must
    /// be positive.
    pub fn mark(&mut self, price: f64, date: NaiveDate) -> Result<(), PortsimError> {
        if date < self.last_date {
            return Err(PortsimError::Ledger {
                reason: format!(
                    "mark date {} for {} precedes position date {}",
                    date, self.asset, self.last_date
                ),
            });
        }
        if !(price > 0.0) || !price.is_finite() {
            return Err(PortsimError::DataUnavailable {
                asset: self.asset.clone(),
                date,
            });
        }
        self.last_price = price;
        self.last_date = date;
        Ok(())
    }

    /// Apply a fill to this position.
    ///
    /// Same-direction fills extend the weighted-average cost basis;
    /// opposite-direction fills realize P&L against it and leave the basis
    /// unchanged. A fill larger than the open quantity in the opposite
    /// direction is an error: the broker must split it into two legs.
    pub fn apply(&mut self, txn: &Transaction) -> Result<(), PortsimError> {
        if txn.asset != self.asset {
            return Err(PortsimError::Ledger {
                reason: format!(
                    "transaction in {} applied to position in {}",
                    txn.asset, self.asset
                ),
            });
        }
        if txn.date < self.last_date {
            return Err(PortsimError::Ledger {
                reason: format!(
                    "transaction date {} for {} precedes position date {}",
                    txn.date, self.asset, self.last_date
                ),
            });
        }
        if txn.quantity == 0.0 {
            return Ok(());
        }

        let same_direction = self.direction() as f64 * txn.quantity >= 0.0;
        if same_direction {
            let open = self.quantity.abs();
            let added = txn.quantity.abs();
            self.cost_basis = (self.cost_basis * open + txn.price * added) / (open + added);
            self.quantity += txn.quantity;
            self.realized_pnl -= txn.commission;
        } else {
            let closed = txn.quantity.abs();
            if closed > self.quantity.abs() + 1e-9 {
                return Err(PortsimError::Ledger {
                    reason: format!(
                        "fill of {} in {} crosses through zero (open {})",
                        txn.quantity, self.asset, self.quantity
                    ),
                });
            }
            self.realized_pnl += (txn.price - self.cost_basis) * closed * self.direction() as f64
                - txn.commission;
            self.quantity += txn.quantity;
            if self.quantity.abs() < 1e-9 {
                self.quantity = 0.0;
            }
        }

        self.last_price = txn.price;
        self.last_date = txn.date;
        self.check_invariants()
    }

    fn check_invariants(&self) -> Result<(), PortsimError> {
        if !self.quantity.is_finite() || !self.cost_basis.is_finite() || self.cost_basis < 0.0 {
            return Err(PortsimError::Ledger {
                reason: format!(
                    "position {} left in invalid state: qty {}, basis {}",
                    self.asset, self.quantity, self.cost_basis
                ),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 1, d).unwrap()
    }

    fn txn(quantity: f64, price: f64, commission: f64, d: u32) -> Transaction {
        Transaction {
            asset: "SPY".into(),
            quantity,
            price,
            commission,
            date: date(d),
            order_id: 1,
        }
    }

    #[test]
    fn open_long_from_transaction() {
        let pos = Position::open_from_transaction(&txn(100.0, 50.0, 1.0, 2)).unwrap();
        assert!(pos.is_long());
        assert_relative_eq!(pos.cost_basis, 50.0);
        assert_relative_eq!(pos.realized_pnl, -1.0);
    }

    #[test]
    fn open_short_from_transaction() {
        let pos = Position::open_from_transaction(&txn(-100.0, 50.0, 0.0, 2)).unwrap();
        assert!(pos.is_short());
        assert_eq!(pos.direction(), -1);
        assert_relative_eq!(pos.market_value(55.0), -5500.0);
    }

    #[test]
    fn same_direction_fill_averages_cost_basis() {
        let mut pos = Position::open_from_transaction(&txn(100.0, 50.0, 0.0, 2)).unwrap();
        pos.apply(&txn(100.0, 60.0, 0.0, 3)).unwrap();
        assert_relative_eq!(pos.quantity, 200.0);
        assert_relative_eq!(pos.cost_basis, 55.0);
    }

    #[test]
    fn reducing_fill_realizes_pnl_against_basis() {
        let mut pos = Position::open_from_transaction(&txn(100.0, 50.0, 0.0, 2)).unwrap();
        pos.apply(&txn(-40.0, 60.0, 2.0, 3)).unwrap();
        assert_relative_eq!(pos.quantity, 60.0);
        // 40 shares closed at +10 each, less 2.0 commission
        assert_relative_eq!(pos.realized_pnl, 398.0);
        assert_relative_eq!(pos.cost_basis, 50.0);
    }

    #[test]
    fn short_cover_realizes_inverse_pnl() {
        let mut pos = Position::open_from_transaction(&txn(-100.0, 50.0, 0.0, 2)).unwrap();
        pos.apply(&txn(100.0, 45.0, 0.0, 3)).unwrap();
        assert_relative_eq!(pos.quantity, 0.0);
        assert_relative_eq!(pos.realized_pnl, 500.0);
    }

    #[test]
    fn zero_cross_fill_is_rejected() {
        let mut pos = Position::open_from_transaction(&txn(100.0, 50.0, 0.0, 2)).unwrap();
        let err = pos.apply(&txn(-150.0, 50.0, 0.0, 3)).unwrap_err();
        assert!(matches!(err, PortsimError::Ledger { .. }));
        // position untouched on failure
        assert_relative_eq!(pos.quantity, 100.0);
    }

    #[test]
    fn backdated_transaction_is_rejected() {
        let mut pos = Position::open_from_transaction(&txn(100.0, 50.0, 0.0, 5)).unwrap();
        assert!(pos.apply(&txn(10.0, 50.0, 0.0, 3)).is_err());
    }

    #[test]
    fn mark_rejects_non_positive_price() {
        let mut pos = Position::open_from_transaction(&txn(100.0, 50.0, 0.0, 2)).unwrap();
        assert!(matches!(
            pos.mark(f64::NAN, date(3)),
            Err(PortsimError::DataUnavailable { .. })
        ));
        assert!(pos.mark(0.0, date(3)).is_err());
        pos.mark(51.0, date(3)).unwrap();
        assert_relative_eq!(pos.last_price, 51.0);
    }

    #[test]
    fn unrealized_pnl_long_and_short() {
        let long = Position::open_from_transaction(&txn(100.0, 50.0, 0.0, 2)).unwrap();
        assert_relative_eq!(long.unrealized_pnl(55.0), 500.0);
        let short = Position::open_from_transaction(&txn(-100.0, 50.0, 0.0, 2)).unwrap();
        assert_relative_eq!(short.unrealized_pnl(55.0), -500.0);
    }
}
