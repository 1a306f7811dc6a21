//! CSV price source adapter.
//!
//! Loads one `{SYMBOL}.csv` bar file per asset from a data directory into
//! memory up front. Files carry `date,open,high,low,close,volume` rows in
//! ascending date order; only open and close are retained. Lookups after
//! loading never touch the filesystem, so a mid-run price miss is a real
//! data gap and not an I/O failure.

use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::path::Path;

use crate::domain::error::PortsimError;
use crate::ports::price_port::{PriceField, PricePort};

#[derive(Debug)]
pub struct CsvPriceAdapter {
    /// symbol -> date -> (open, close)
    bars: BTreeMap<String, BTreeMap<NaiveDate, (f64, f64)>>,
}

impl CsvPriceAdapter {
    /// Load the bar files for `symbols` from `data_dir`.
    pub fn load<P: AsRef<Path>>(data_dir: P, symbols: &[String]) -> Result<Self, PortsimError> {
        let mut bars = BTreeMap::new();
        for symbol in symbols {
            let path = data_dir.as_ref().join(format!("{symbol}.csv"));
            bars.insert(symbol.clone(), read_bar_file(&path)?);
        }
        Ok(CsvPriceAdapter { bars })
    }

    /// Symbols with a bar file in `data_dir`, sorted.
    pub fn list_symbols<P: AsRef<Path>>(data_dir: P) -> Result<Vec<String>, PortsimError> {
        let mut symbols = Vec::new();
        for entry in std::fs::read_dir(data_dir.as_ref())? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "csv") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    symbols.push(stem.to_string());
                }
            }
        }
        symbols.sort();
        Ok(symbols)
    }
}

fn read_bar_file(path: &Path) -> Result<BTreeMap<NaiveDate, (f64, f64)>, PortsimError> {
    let mut rdr = csv::Reader::from_path(path).map_err(|e| PortsimError::ConfigParse {
        file: path.display().to_string(),
        reason: e.to_string(),
    })?;

    let mut bars = BTreeMap::new();
    for result in rdr.records() {
        let record = result.map_err(|e| parse_error(path, format!("bad row: {e}")))?;

        let date_str = record
            .get(0)
            .ok_or_else(|| parse_error(path, "missing date column"))?;
        let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
            .map_err(|e| parse_error(path, format!("invalid date '{date_str}': {e}")))?;
        let open = parse_field(&record, 1, "open", path)?;
        let close = parse_field(&record, 4, "close", path)?;

        bars.insert(date, (open, close));
    }
    Ok(bars)
}

fn parse_field(
    record: &csv::StringRecord,
    index: usize,
    name: &str,
    path: &Path,
) -> Result<f64, PortsimError> {
    record
        .get(index)
        .ok_or_else(|| parse_error(path, format!("missing {name} column")))?
        .parse()
        .map_err(|e| parse_error(path, format!("invalid {name} value: {e}")))
}

fn parse_error(path: &Path, reason: impl Into<String>) -> PortsimError {
    PortsimError::ConfigParse {
        file: path.display().to_string(),
        reason: reason.into(),
    }
}

impl PricePort for CsvPriceAdapter {
    fn price(&self, asset: &str, date: NaiveDate, field: PriceField) -> Result<f64, PortsimError> {
        let value = self
            .bars
            .get(asset)
            .and_then(|series| series.get(&date))
            .map(|(open, close)| match field {
                PriceField::Open => *open,
                PriceField::Close => *close,
            });
        match value {
            Some(v) if v.is_finite() && v > 0.0 => Ok(v),
            _ => Err(PortsimError::DataUnavailable {
                asset: asset.to_string(),
                date,
            }),
        }
    }

    fn latest_price(&self, asset: &str, date: NaiveDate) -> Result<f64, PortsimError> {
        let value = self
            .bars
            .get(asset)
            .and_then(|series| series.range(..=date).next_back())
            .map(|(_, (_, close))| *close);
        match value {
            Some(v) if v.is_finite() && v > 0.0 => Ok(v),
            _ => Err(PortsimError::DataUnavailable {
                asset: asset.to_string(),
                date,
            }),
        }
    }
}
