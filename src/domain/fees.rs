//! Commission and slippage models.
//!
//! Both are pure functions of (asset, quantity, price) injected into the
//! broker at construction; the simulation core never hard-codes a fee
//! schedule.

/// Commission charged for a fill. Implementations must be pure: the same
/// inputs always produce the same fee, or replay determinism is lost.
pub trait FeeModel {
    fn commission(&self, asset: &str, quantity: f64, consideration: f64) -> f64;
}

/// No commission or tax of any kind.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZeroFee;

impl FeeModel for ZeroFee {
    fn commission(&self, _asset: &str, _quantity: f64, _consideration: f64) -> f64 {
        0.0
    }
}

/// Flat fee per order plus a percentage of the traded notional, with an
/// optional per-order minimum.
#[derive(Debug, Clone, Copy)]
pub struct PercentFee {
    pub flat: f64,
    pub rate_pct: f64,
    pub minimum: f64,
}

impl PercentFee {
    pub fn new(flat: f64, rate_pct: f64) -> Self {
        PercentFee {
            flat,
            rate_pct,
            minimum: 0.0,
        }
    }
}

impl FeeModel for PercentFee {
    fn commission(&self, _asset: &str, _quantity: f64, consideration: f64) -> f64 {
        let fee = self.flat + consideration.abs() * self.rate_pct / 100.0;
        fee.max(self.minimum)
    }
}

/// Adjustment of the market price into a fill price. The adjustment is
/// direction-aware: buys fill above the market price, sells below.
pub trait SlippageModel {
    fn fill_price(&self, asset: &str, quantity: f64, market_price: f64) -> f64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoSlippage;

impl SlippageModel for NoSlippage {
    fn fill_price(&self, _asset: &str, _quantity: f64, market_price: f64) -> f64 {
        market_price
    }
}

/// Fixed percentage slippage against the order side.
#[derive(Debug, Clone, Copy)]
pub struct PercentSlippage {
    pub rate_pct: f64,
}

impl SlippageModel for PercentSlippage {
    fn fill_price(&self, _asset: &str, quantity: f64, market_price: f64) -> f64 {
        if quantity >= 0.0 {
            market_price * (1.0 + self.rate_pct / 100.0)
        } else {
            market_price * (1.0 - self.rate_pct / 100.0)
        }
    }
}
