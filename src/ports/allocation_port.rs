//! Allocation provider port trait (alpha/risk model boundary).

use chrono::NaiveDate;
use std::collections::BTreeMap;

use crate::domain::asset::Asset;
use crate::domain::error::PortsimError;
use crate::domain::ledger::EquitySnapshot;

pub trait AllocationPort {
    /// Target weights for the rebalance on `date`, given the eligible
    /// universe and a read-only ledger snapshot. Weights are not
    /// normalized by the core; scaling is owned by the order sizer.
    /// Returning a weight for an asset outside `eligible` aborts the run.
    fn allocate(
        &self,
        date: NaiveDate,
        eligible: &[Asset],
        ledger: &EquitySnapshot,
    ) -> Result<BTreeMap<String, f64>, PortsimError>;
}
