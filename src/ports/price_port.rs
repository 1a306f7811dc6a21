//! Price source port trait.
//!
//! The simulation core never loads market data itself; it consumes prices
//! through this seam and treats a missing or non-numeric price as fatal
//! when one is required for a fill or an active valuation.

use chrono::NaiveDate;

use crate::domain::error::PortsimError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceField {
    Open,
    Close,
}

pub trait PricePort {
    /// Price for (asset, date, field). Fails with
    /// [`PortsimError::DataUnavailable`] when the value is missing or NaN.
    fn price(&self, asset: &str, date: NaiveDate, field: PriceField)
    -> Result<f64, PortsimError>;

    /// Most recent close at or before `date`, for point-in-time valuation
    /// of positions on days the asset did not print. Fails when no price
    /// at all is known by `date`.
    fn latest_price(&self, asset: &str, date: NaiveDate) -> Result<f64, PortsimError>;
}
