//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_price_adapter::CsvPriceAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::fixed_weight_adapter::FixedWeightAdapter;
use crate::domain::broker::SimulatedBroker;
use crate::domain::config_validation::{
    self, broker_config, fee_model, simulation_config, sizer_config, slippage_model,
    target_weights, universe,
};
use crate::domain::error::PortsimError;
use crate::domain::simulation::{Simulation, SimulationResult};
use crate::domain::sizer::OrderSizer;
use crate::ports::config_port::ConfigPort;

#[derive(Parser, Debug)]
#[command(name = "portsim", about = "Systematic portfolio backtest simulator")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a simulation
    Run {
        #[arg(short, long)]
        config: PathBuf,
        /// Write the daily equity curve to this CSV file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate a simulation configuration without running it
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List assets with bar files in a data directory
    ListAssets {
        #[arg(short, long)]
        data_dir: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Run { config, output } => run_simulation(&config, output.as_deref()),
        Command::Validate { config } => run_validate(&config),
        Command::ListAssets { data_dir } => run_list_assets(&data_dir),
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = PortsimError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

fn run_simulation(config_path: &Path, output_path: Option<&Path>) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let result = match build_and_run(&adapter) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    if let Some(path) = output_path {
        if let Err(e) = write_equity_curve(&result, path) {
            eprintln!("error: {e}");
            return (&e).into();
        }
        eprintln!("Equity curve written to {}", path.display());
    }

    print_summary(&result);
    ExitCode::SUCCESS
}

fn build_and_run(adapter: &dyn ConfigPort) -> Result<SimulationResult, PortsimError> {
    let sim_config = simulation_config(adapter)?;
    let universe = universe(adapter)?;
    let weights = target_weights(adapter)?;
    let sizer = OrderSizer::new(sizer_config(adapter)?)?;
    let broker = SimulatedBroker::new(
        broker_config(adapter)?,
        fee_model(adapter)?,
        slippage_model(adapter)?,
    );

    let data_dir = adapter
        .get_string("data", "directory")
        .ok_or_else(|| PortsimError::ConfigMissing {
            section: "data".to_string(),
            key: "directory".to_string(),
        })?;
    let symbols: Vec<String> = universe
        .members_at(sim_config.start_date)
        .into_iter()
        .map(|a| a.symbol)
        .collect();
    eprintln!("Loading bar files for {} assets from {data_dir}", symbols.len());
    let prices = CsvPriceAdapter::load(&data_dir, &symbols)?;

    eprintln!(
        "Simulating {} to {}",
        sim_config.start_date, sim_config.end_date
    );
    let simulation = Simulation::new(
        sim_config,
        universe,
        sizer,
        broker,
        Box::new(FixedWeightAdapter::new(weights)),
        Box::new(prices),
    )?;
    simulation.run()
}

fn write_equity_curve(
    result: &SimulationResult,
    path: &Path,
) -> Result<(), PortsimError> {
    let io_err = |e: csv::Error| std::io::Error::other(e.to_string());
    let mut writer = csv::Writer::from_path(path).map_err(io_err)?;
    writer
        .write_record(["date", "cash", "total_equity"])
        .map_err(io_err)?;
    for snap in &result.equity_curve {
        writer
            .write_record([
                snap.date.to_string(),
                format!("{:.2}", snap.cash),
                format!("{:.2}", snap.total_equity),
            ])
            .map_err(io_err)?;
    }
    writer.flush()?;
    Ok(())
}

fn print_summary(result: &SimulationResult) {
    println!("Simulation complete");
    for (name, value) in &result.summary {
        println!("  {name}: {value:.2}");
    }
    if !result.rejections.is_empty() {
        println!("Rejected orders:");
        for r in &result.rejections {
            println!(
                "  {} {} qty {:.2}: required {:.2}, available {:.2}",
                r.date, r.asset, r.quantity, r.required, r.available
            );
        }
    }
}

fn run_validate(config_path: &Path) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    match config_validation::validate_config(&adapter) {
        Ok(()) => {
            println!("Config OK");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

fn run_list_assets(data_dir: &Path) -> ExitCode {
    match CsvPriceAdapter::list_symbols(data_dir) {
        Ok(symbols) => {
            for symbol in symbols {
                println!("{symbol}");
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}
