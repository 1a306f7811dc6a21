//! Immutable transaction records emitted by the simulated broker.

use chrono::NaiveDate;

/// A single executed fill. Immutable once recorded; the ledger keeps an
/// append-only history of these and can be rebuilt from it exactly.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub asset: String,
    /// Signed quantity: positive = buy, negative = sell.
    pub quantity: f64,
    pub price: f64,
    pub commission: f64,
    pub date: NaiveDate,
    pub order_id: u64,
}

impl Transaction {
    /// 1 for a buy, -1 for a sell.
    pub fn direction(&self) -> i8 {
        if self.quantity >= 0.0 { 1 } else { -1 }
    }

    pub fn consideration(&self) -> f64 {
        self.quantity * self.price
    }

    /// Signed effect on the cash balance: a buy debits, a sell credits,
    /// commission always debits.
    pub fn cash_effect(&self) -> f64 {
        -(self.consideration() + self.commission)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn txn(quantity: f64, price: f64, commission: f64) -> Transaction {
        Transaction {
            asset: "SPY".into(),
            quantity,
            price,
            commission,
            date: NaiveDate::from_ymd_opt(2020, 1, 2).unwrap(),
            order_id: 1,
        }
    }

    #[test]
    fn buy_debits_cash() {
        let t = txn(100.0, 50.0, 5.0);
        assert_eq!(t.direction(), 1);
        assert!((t.cash_effect() - (-5005.0)).abs() < f64::EPSILON);
    }

    #[test]
    fn sell_credits_cash_net_of_commission() {
        let t = txn(-100.0, 50.0, 5.0);
        assert_eq!(t.direction(), -1);
        assert!((t.cash_effect() - 4995.0).abs() < f64::EPSILON);
    }
}
