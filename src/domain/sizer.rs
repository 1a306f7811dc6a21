//! Order sizing: target weights to signed order-quantity deltas.
//!
//! Sizing works off the ledger's pre-rebalance total equity (not cash) so
//! gains on open positions are reflected, applies gross leverage, caps
//! gross exposure by scaling every weight proportionally, and suppresses
//! deltas too small to be worth the churn.

use chrono::NaiveDate;
use std::collections::BTreeMap;

use super::error::PortsimError;
use super::ledger::Ledger;
use super::order::Order;
use crate::ports::price_port::PricePort;

#[derive(Debug, Clone, Copy)]
pub struct SizerConfig {
    /// Leverage multiplier applied to every target notional. Must be
    /// positive.
    pub gross_leverage: f64,
    /// Cap on total gross exposure (sum of |weight| x leverage). When the
    /// requested exposure exceeds it, all weights are scaled down by the
    /// same factor, preserving relative allocation shape.
    pub max_gross_exposure: f64,
    /// Negative target weights are a configuration error unless set.
    pub allow_short: bool,
    /// Size in fractional shares instead of whole-share truncation.
    pub fractional_shares: bool,
    /// Deltas below this percentage of equity are suppressed.
    pub rebalance_threshold_pct: f64,
    /// Fraction of equity (0-1) reserved as headroom for commission and
    /// rounding, so a fully-weighted entry order still clears the cash
    /// floor after fees. Zero disables the buffer.
    pub cash_buffer_fraction: f64,
}

impl Default for SizerConfig {
    fn default() -> Self {
        SizerConfig {
            gross_leverage: 1.0,
            max_gross_exposure: 1.0,
            allow_short: false,
            fractional_shares: false,
            rebalance_threshold_pct: 0.0,
            cash_buffer_fraction: 0.05,
        }
    }
}

impl SizerConfig {
    pub fn validate(&self) -> Result<(), PortsimError> {
        if !(self.gross_leverage > 0.0) {
            return Err(PortsimError::config(format!(
                "gross leverage {} must be positive",
                self.gross_leverage
            )));
        }
        if !(self.max_gross_exposure > 0.0) {
            return Err(PortsimError::config(format!(
                "max gross exposure {} must be positive",
                self.max_gross_exposure
            )));
        }
        if self.rebalance_threshold_pct < 0.0 {
            return Err(PortsimError::config(
                "rebalance threshold must be non-negative",
            ));
        }
        if !(0.0..1.0).contains(&self.cash_buffer_fraction) {
            return Err(PortsimError::config(format!(
                "cash buffer {} must lie in [0, 1)",
                self.cash_buffer_fraction
            )));
        }
        Ok(())
    }
}

/// Converts target weights into an ordered list of market orders. Also
/// owns the order-id sequence so replays number orders identically.
#[derive(Debug)]
pub struct OrderSizer {
    config: SizerConfig,
    next_order_id: u64,
}

impl OrderSizer {
    pub fn new(config: SizerConfig) -> Result<Self, PortsimError> {
        config.validate()?;
        Ok(OrderSizer {
            config,
            next_order_id: 1,
        })
    }

    /// Size the rebalance orders for `date`.
    ///
    /// Held assets absent from `weights` are targeted at weight zero so
    /// they are liquidated. Output is ordered by asset symbol.
    pub fn size_orders(
        &mut self,
        date: NaiveDate,
        weights: &BTreeMap<String, f64>,
        ledger: &Ledger,
        prices: &dyn PricePort,
    ) -> Result<Vec<Order>, PortsimError> {
        for (asset, weight) in weights {
            if *weight < 0.0 && !self.config.allow_short {
                return Err(PortsimError::config(format!(
                    "negative target weight {weight} for {asset} with short selling disabled"
                )));
            }
        }

        let reference_equity = ledger.total_equity();
        let investable = reference_equity * (1.0 - self.config.cash_buffer_fraction);

        // Proportional scale-down when the requested gross exposure
        // exceeds the cap; never truncate individual weights.
        let gross: f64 = weights.values().map(|w| w.abs()).sum::<f64>() * self.config.gross_leverage;
        let scale = if gross > self.config.max_gross_exposure {
            self.config.max_gross_exposure / gross
        } else {
            1.0
        };

        // Union of targeted and held assets: anything held but no longer
        // targeted is sized back to zero.
        let mut targets: BTreeMap<String, f64> = weights.clone();
        for asset in ledger.held_assets() {
            targets.entry(asset).or_insert(0.0);
        }

        let mut orders = Vec::new();
        for (asset, weight) in &targets {
            let price = prices.latest_price(asset, date)?;
            if !(price > 0.0) || !price.is_finite() {
                return Err(PortsimError::DataUnavailable {
                    asset: asset.clone(),
                    date,
                });
            }

            let target_notional = weight * scale * self.config.gross_leverage * investable;
            let target_qty = if self.config.fractional_shares {
                target_notional / price
            } else {
                (target_notional / price).trunc()
            };

            let delta = target_qty - ledger.quantity(asset);
            if delta == 0.0 {
                continue;
            }
            if delta.abs() * price
                < self.config.rebalance_threshold_pct / 100.0 * reference_equity
            {
                continue;
            }

            orders.push(Order::new(self.next_order_id, asset.clone(), delta, date));
            self.next_order_id += 1;
        }
        Ok(orders)
    }
}
