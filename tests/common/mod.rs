#![allow(dead_code)]

use chrono::NaiveDate;
use portsim::domain::asset::Asset;
use portsim::domain::broker::{BrokerConfig, SimulatedBroker};
use portsim::domain::error::PortsimError;
use portsim::domain::fees::{NoSlippage, ZeroFee};
use portsim::domain::ledger::EquitySnapshot;
use portsim::domain::schedule::RebalanceRule;
use portsim::domain::simulation::{Simulation, SimulationConfig};
use portsim::domain::sizer::{OrderSizer, SizerConfig};
use portsim::domain::universe::Universe;
use portsim::ports::allocation_port::AllocationPort;
use portsim::ports::price_port::{PriceField, PricePort};
use std::collections::BTreeMap;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// In-memory price source keyed by (symbol, date). Dates without an entry
/// fall back to the most recent close, like the CSV adapter.
#[derive(Clone)]
pub struct MockPricePort {
    pub series: BTreeMap<String, BTreeMap<NaiveDate, f64>>,
}

impl MockPricePort {
    pub fn new() -> Self {
        MockPricePort {
            series: BTreeMap::new(),
        }
    }

    pub fn with_bar(mut self, symbol: &str, date: NaiveDate, close: f64) -> Self {
        self.series
            .entry(symbol.to_string())
            .or_default()
            .insert(date, close);
        self
    }

    /// A constant close on every day of `[start, end]`.
    pub fn with_flat_series(
        mut self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
        close: f64,
    ) -> Self {
        let mut day = start;
        while day <= end {
            self.series
                .entry(symbol.to_string())
                .or_default()
                .insert(day, close);
            day = day.succ_opt().unwrap();
        }
        self
    }

    /// A close that grows by `daily_change` each successive calendar day.
    pub fn with_linear_series(
        mut self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
        initial: f64,
        daily_change: f64,
    ) -> Self {
        let mut day = start;
        let mut close = initial;
        while day <= end {
            self.series
                .entry(symbol.to_string())
                .or_default()
                .insert(day, close);
            close += daily_change;
            day = day.succ_opt().unwrap();
        }
        self
    }
}

impl PricePort for MockPricePort {
    fn price(&self, asset: &str, date: NaiveDate, _field: PriceField) -> Result<f64, PortsimError> {
        self.latest_price(asset, date)
    }

    fn latest_price(&self, asset: &str, date: NaiveDate) -> Result<f64, PortsimError> {
        self.series
            .get(asset)
            .and_then(|s| s.range(..=date).next_back())
            .map(|(_, close)| *close)
            .ok_or_else(|| PortsimError::DataUnavailable {
                asset: asset.to_string(),
                date,
            })
    }
}

/// Allocation mock returning a fixed weight map, or per-date overrides
/// when any are registered.
pub struct MockAllocation {
    pub default: BTreeMap<String, f64>,
    pub by_date: BTreeMap<NaiveDate, BTreeMap<String, f64>>,
}

impl MockAllocation {
    pub fn fixed(weights: &[(&str, f64)]) -> Self {
        MockAllocation {
            default: weights.iter().map(|(s, w)| (s.to_string(), *w)).collect(),
            by_date: BTreeMap::new(),
        }
    }

    pub fn on(mut self, date: NaiveDate, weights: &[(&str, f64)]) -> Self {
        self.by_date
            .insert(date, weights.iter().map(|(s, w)| (s.to_string(), *w)).collect());
        self
    }
}

impl AllocationPort for MockAllocation {
    fn allocate(
        &self,
        date: NaiveDate,
        _eligible: &[Asset],
        _ledger: &EquitySnapshot,
    ) -> Result<BTreeMap<String, f64>, PortsimError> {
        Ok(self.by_date.get(&date).cloned().unwrap_or_else(|| self.default.clone()))
    }
}

pub fn sample_config(rebalance: RebalanceRule) -> SimulationConfig {
    SimulationConfig {
        start_date: date(2020, 1, 1),
        end_date: date(2020, 6, 30),
        initial_cash: 100_000.0,
        rebalance,
        burn_in: None,
    }
}

/// A simulation over a static universe with zero fees and no slippage.
pub fn build_simulation(
    config: SimulationConfig,
    sizer: SizerConfig,
    symbols: &[&str],
    allocation: MockAllocation,
    prices: MockPricePort,
) -> Simulation {
    let broker =
        SimulatedBroker::new(BrokerConfig::default(), Box::new(ZeroFee), Box::new(NoSlippage));
    build_simulation_with_broker(config, sizer, symbols, allocation, prices, broker)
}

pub fn build_simulation_with_broker(
    config: SimulationConfig,
    sizer: SizerConfig,
    symbols: &[&str],
    allocation: MockAllocation,
    prices: MockPricePort,
    broker: SimulatedBroker,
) -> Simulation {
    let assets = symbols.iter().map(|s| Asset::etf(*s)).collect();
    Simulation::new(
        config,
        Universe::fixed(assets),
        OrderSizer::new(sizer).unwrap(),
        broker,
        Box::new(allocation),
        Box::new(prices),
    )
    .unwrap()
}
