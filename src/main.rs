use clap::Parser;
use portsim::cli::{Cli, run};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
