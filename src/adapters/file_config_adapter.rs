//! INI file configuration adapter.

use configparser::ini::Ini;
use std::collections::BTreeMap;
use std::path::Path;

use crate::ports::config_port::ConfigPort;

pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let mut config = Ini::new();
        config.load(path).map_err(std::io::Error::other)?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, String> {
        let mut config = Ini::new();
        config.read(content.to_string())?;
        Ok(Self { config })
    }

    fn parse_bool(value: &str) -> Option<bool> {
        match value.to_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        }
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.config
            .getint(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
        self.config
            .getfloat(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        self.config
            .get(section, key)
            .as_ref()
            .and_then(|v| Self::parse_bool(v))
            .unwrap_or(default)
    }

    fn get_section(&self, section: &str) -> Option<BTreeMap<String, String>> {
        let map = self.config.get_map_ref();
        let entries: BTreeMap<String, String> = map
            .get(&section.to_lowercase())?
            .iter()
            .filter_map(|(key, value)| value.clone().map(|v| (key.clone(), v)))
            .collect();
        Some(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = r#"
[simulation]
start_date = 2020-01-01
end_date = 2020-12-31
initial_cash = 100000.0
rebalance = end_of_month

[sizing]
gross_leverage = 1.0
allow_short = false

[weights]
SPY = 0.6
AGG = 0.4
"#;

    #[test]
    fn from_string_parses_config() {
        let adapter = FileConfigAdapter::from_string(SAMPLE).unwrap();
        assert_eq!(
            adapter.get_string("simulation", "start_date").as_deref(),
            Some("2020-01-01")
        );
        assert_eq!(adapter.get_double("simulation", "initial_cash", 0.0), 100_000.0);
        assert!(!adapter.get_bool("sizing", "allow_short", true));
    }

    #[test]
    fn from_file_parses_config() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", SAMPLE).unwrap();
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(
            adapter.get_string("simulation", "rebalance").as_deref(),
            Some("end_of_month")
        );
    }

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let adapter = FileConfigAdapter::from_string(SAMPLE).unwrap();
        assert!(adapter.get_string("simulation", "burn_in_date").is_none());
        assert_eq!(adapter.get_int("simulation", "rebalance_interval", 21), 21);
        assert_eq!(adapter.get_double("execution", "slippage_pct", 0.0), 0.0);
    }

    #[test]
    fn get_section_returns_all_weight_entries() {
        let adapter = FileConfigAdapter::from_string(SAMPLE).unwrap();
        let weights = adapter.get_section("weights").unwrap();
        assert_eq!(weights.len(), 2);
        // configparser lower-cases keys
        assert_eq!(weights["spy"], "0.6");
        assert_eq!(weights["agg"], "0.4");
    }

    #[test]
    fn get_section_missing_is_none() {
        let adapter = FileConfigAdapter::from_string(SAMPLE).unwrap();
        assert!(adapter.get_section("nope").is_none());
    }
}
