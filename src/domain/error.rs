//! Domain error types.
//!
//! Fatal errors abort a simulation run; insufficient-cash order rejections
//! are recoverable and accumulate in the run result instead (see
//! [`crate::domain::broker`]).

use chrono::NaiveDate;

/// Top-level error type for portsim.
#[derive(Debug, thiserror::Error)]
pub enum PortsimError {
    #[error("configuration error: {reason}")]
    Configuration { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    /// A price needed for a fill or valuation is missing or non-numeric.
    /// A data gap mid-run cannot be skipped without corrupting the ledger.
    #[error("no usable price for {asset} on {date}")]
    DataUnavailable { asset: String, date: NaiveDate },

    /// An order or weight referenced an asset outside its universe
    /// membership window.
    #[error("asset {asset} is not a universe member on {date}")]
    UniverseInconsistency { asset: String, date: NaiveDate },

    /// Raised in place of a recoverable rejection when the insufficient-cash
    /// policy is set to abort the run.
    #[error(
        "infeasible order for {asset} on {date}: requires {required:.2}, \
         only {available:.2} available above the cash floor"
    )]
    OrderInfeasible {
        asset: String,
        date: NaiveDate,
        required: f64,
        available: f64,
    },

    #[error("ledger error: {reason}")]
    Ledger { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl PortsimError {
    pub fn config(reason: impl Into<String>) -> Self {
        PortsimError::Configuration {
            reason: reason.into(),
        }
    }
}

impl From<&PortsimError> for std::process::ExitCode {
    fn from(err: &PortsimError) -> Self {
        let code: u8 = match err {
            PortsimError::Io(_) => 1,
            PortsimError::Configuration { .. }
            | PortsimError::ConfigParse { .. }
            | PortsimError::ConfigMissing { .. }
            | PortsimError::ConfigInvalid { .. } => 2,
            PortsimError::DataUnavailable { .. } => 3,
            PortsimError::UniverseInconsistency { .. } => 4,
            PortsimError::OrderInfeasible { .. } | PortsimError::Ledger { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
