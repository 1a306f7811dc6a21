//! Configuration validation and construction.
//!
//! Reads the `[simulation]`, `[sizing]`, `[execution]`, `[universe]` and
//! `[weights]` sections through the config port, validates every field
//! before a run starts, and builds the typed configs the simulation
//! components take. All validation happens up front so a bad file fails
//! fast instead of mid-run.

use chrono::{NaiveDate, Weekday};
use std::collections::BTreeMap;

use super::asset::Asset;
use super::broker::{BrokerConfig, InsufficientCashPolicy};
use super::error::PortsimError;
use super::fees::{FeeModel, NoSlippage, PercentFee, PercentSlippage, SlippageModel, ZeroFee};
use super::schedule::RebalanceRule;
use super::simulation::SimulationConfig;
use super::sizer::SizerConfig;
use super::universe::Universe;
use crate::ports::config_port::ConfigPort;

pub fn validate_config(config: &dyn ConfigPort) -> Result<(), PortsimError> {
    simulation_config(config)?;
    sizer_config(config)?;
    broker_config(config)?;
    universe(config)?;
    target_weights(config)?;
    Ok(())
}

pub fn simulation_config(config: &dyn ConfigPort) -> Result<SimulationConfig, PortsimError> {
    let start_date = require_date(config, "simulation", "start_date")?;
    let end_date = require_date(config, "simulation", "end_date")?;
    let initial_cash = config.get_double("simulation", "initial_cash", 0.0);
    if initial_cash <= 0.0 {
        return Err(invalid(
            "simulation",
            "initial_cash",
            "initial_cash must be positive",
        ));
    }
    let burn_in = match config.get_string("simulation", "burn_in_date") {
        Some(s) => Some(parse_date(&s, "simulation", "burn_in_date")?),
        None => None,
    };

    let cfg = SimulationConfig {
        start_date,
        end_date,
        initial_cash,
        rebalance: rebalance_rule(config)?,
        burn_in,
    };
    cfg.validate()?;
    Ok(cfg)
}

fn rebalance_rule(config: &dyn ConfigPort) -> Result<RebalanceRule, PortsimError> {
    let name = config
        .get_string("simulation", "rebalance")
        .unwrap_or_else(|| "buy_and_hold".to_string());
    match name.as_str() {
        "buy_and_hold" => Ok(RebalanceRule::BuyAndHold),
        "daily" => Ok(RebalanceRule::Daily),
        "weekly" => {
            let day = config
                .get_string("simulation", "rebalance_weekday")
                .unwrap_or_else(|| "mon".to_string());
            Ok(RebalanceRule::Weekly(parse_weekday(&day)?))
        }
        "end_of_month" => Ok(RebalanceRule::EndOfMonth),
        "every_n_days" => {
            let n = config.get_int("simulation", "rebalance_interval", 0);
            if n <= 0 {
                return Err(invalid(
                    "simulation",
                    "rebalance_interval",
                    "rebalance_interval must be a positive number of trading days",
                ));
            }
            Ok(RebalanceRule::EveryNDays(n as usize))
        }
        other => Err(invalid(
            "simulation",
            "rebalance",
            format!(
                "unknown rebalance rule '{other}', expected buy_and_hold, daily, \
                 weekly, end_of_month or every_n_days"
            ),
        )),
    }
}

fn parse_weekday(value: &str) -> Result<Weekday, PortsimError> {
    match value.to_lowercase().as_str() {
        "mon" | "monday" => Ok(Weekday::Mon),
        "tue" | "tuesday" => Ok(Weekday::Tue),
        "wed" | "wednesday" => Ok(Weekday::Wed),
        "thu" | "thursday" => Ok(Weekday::Thu),
        "fri" | "friday" => Ok(Weekday::Fri),
        _ => Err(invalid(
            "simulation",
            "rebalance_weekday",
            format!("'{value}' is not a trading weekday (mon..fri)"),
        )),
    }
}

pub fn sizer_config(config: &dyn ConfigPort) -> Result<SizerConfig, PortsimError> {
    let cfg = SizerConfig {
        gross_leverage: config.get_double("sizing", "gross_leverage", 1.0),
        max_gross_exposure: config.get_double("sizing", "max_gross_exposure", 1.0),
        allow_short: config.get_bool("sizing", "allow_short", false),
        fractional_shares: config.get_bool("sizing", "fractional_shares", false),
        rebalance_threshold_pct: config.get_double("sizing", "rebalance_threshold_pct", 0.0),
        cash_buffer_fraction: config.get_double("sizing", "cash_buffer_fraction", 0.05),
    };
    cfg.validate()?;
    Ok(cfg)
}

pub fn broker_config(config: &dyn ConfigPort) -> Result<BrokerConfig, PortsimError> {
    let policy = match config
        .get_string("execution", "insufficient_cash")
        .unwrap_or_else(|| "reject".to_string())
        .as_str()
    {
        "reject" => InsufficientCashPolicy::Reject,
        "abort" => InsufficientCashPolicy::Abort,
        other => {
            return Err(invalid(
                "execution",
                "insufficient_cash",
                format!("unknown policy '{other}', expected reject or abort"),
            ));
        }
    };
    Ok(BrokerConfig {
        min_cash: config.get_double("execution", "min_cash", 0.0),
        allow_margin: config.get_bool("execution", "allow_margin", false),
        policy,
    })
}

pub fn fee_model(config: &dyn ConfigPort) -> Result<Box<dyn FeeModel>, PortsimError> {
    let flat = config.get_double("execution", "commission_per_order", 0.0);
    let rate_pct = config.get_double("execution", "commission_pct", 0.0);
    let minimum = config.get_double("execution", "commission_minimum", 0.0);
    if flat < 0.0 || rate_pct < 0.0 || minimum < 0.0 {
        return Err(invalid(
            "execution",
            "commission_per_order",
            "commission settings must be non-negative",
        ));
    }
    if flat == 0.0 && rate_pct == 0.0 && minimum == 0.0 {
        return Ok(Box::new(ZeroFee));
    }
    Ok(Box::new(PercentFee {
        flat,
        rate_pct,
        minimum,
    }))
}

pub fn slippage_model(config: &dyn ConfigPort) -> Result<Box<dyn SlippageModel>, PortsimError> {
    let rate_pct = config.get_double("execution", "slippage_pct", 0.0);
    if rate_pct < 0.0 {
        return Err(invalid(
            "execution",
            "slippage_pct",
            "slippage_pct must be non-negative",
        ));
    }
    if rate_pct == 0.0 {
        return Ok(Box::new(NoSlippage));
    }
    Ok(Box::new(PercentSlippage { rate_pct }))
}

/// Static universe from `[universe] symbols`, a comma-separated list.
pub fn universe(config: &dyn ConfigPort) -> Result<Universe, PortsimError> {
    let symbols = config
        .get_string("universe", "symbols")
        .ok_or_else(|| PortsimError::ConfigMissing {
            section: "universe".to_string(),
            key: "symbols".to_string(),
        })?;
    let assets: Vec<Asset> = symbols
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(Asset::etf)
        .collect();
    if assets.is_empty() {
        return Err(invalid("universe", "symbols", "universe must not be empty"));
    }
    Ok(Universe::fixed(assets))
}

/// Fixed target weights from the free-form `[weights]` section. Every
/// weighted symbol must be a universe member.
pub fn target_weights(config: &dyn ConfigPort) -> Result<BTreeMap<String, f64>, PortsimError> {
    let section = config
        .get_section("weights")
        .ok_or_else(|| PortsimError::ConfigMissing {
            section: "weights".to_string(),
            key: "*".to_string(),
        })?;
    let mut weights = BTreeMap::new();
    for (symbol, raw) in section {
        let weight: f64 = raw.trim().parse().map_err(|_| {
            invalid(
                "weights",
                &symbol,
                format!("'{raw}' is not a valid weight"),
            )
        })?;
        if !weight.is_finite() {
            return Err(invalid("weights", &symbol, "weight must be finite"));
        }
        weights.insert(symbol.to_uppercase(), weight);
    }
    if weights.is_empty() {
        return Err(invalid("weights", "*", "at least one weight is required"));
    }
    Ok(weights)
}

fn require_date(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<NaiveDate, PortsimError> {
    match config.get_string(section, key) {
        None => Err(PortsimError::ConfigMissing {
            section: section.to_string(),
            key: key.to_string(),
        }),
        Some(s) => parse_date(&s, section, key),
    }
}

fn parse_date(value: &str, section: &str, key: &str) -> Result<NaiveDate, PortsimError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
        invalid(
            section,
            key,
            format!("invalid date '{value}', expected YYYY-MM-DD"),
        )
    })
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> PortsimError {
    PortsimError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}
