//! Fixed-weight allocation adapter.
//!
//! The simplest allocation provider: the same target weights on every
//! rebalance date, taken from the `[weights]` config section. Eligibility
//! enforcement lives in the simulation driver, which compares returned
//! weights against the universe.

use chrono::NaiveDate;
use std::collections::BTreeMap;

use crate::domain::asset::Asset;
use crate::domain::error::PortsimError;
use crate::domain::ledger::EquitySnapshot;
use crate::ports::allocation_port::AllocationPort;

pub struct FixedWeightAdapter {
    weights: BTreeMap<String, f64>,
}

impl FixedWeightAdapter {
    pub fn new(weights: BTreeMap<String, f64>) -> Self {
        FixedWeightAdapter { weights }
    }
}

impl AllocationPort for FixedWeightAdapter {
    fn allocate(
        &self,
        _date: NaiveDate,
        _eligible: &[Asset],
        _ledger: &EquitySnapshot,
    ) -> Result<BTreeMap<String, f64>, PortsimError> {
        Ok(self.weights.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returns_the_same_weights_every_date() {
        let adapter = FixedWeightAdapter::new(
            [("SPY".to_string(), 0.6), ("AGG".to_string(), 0.4)]
                .into_iter()
                .collect(),
        );
        let snapshot = EquitySnapshot {
            date: NaiveDate::from_ymd_opt(2020, 1, 6).unwrap(),
            cash: 100_000.0,
            total_equity: 100_000.0,
            position_values: BTreeMap::new(),
        };

        for day in [6, 7, 8] {
            let date = NaiveDate::from_ymd_opt(2020, 1, day).unwrap();
            let weights = adapter.allocate(date, &[], &snapshot).unwrap();
            assert_eq!(weights.len(), 2);
            assert_eq!(weights["SPY"], 0.6);
        }
    }
}
