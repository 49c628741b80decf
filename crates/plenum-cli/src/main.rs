//! Plenum CLI - Replay governance scenarios against a local deployment.

pub mod commands;
pub mod output;
pub mod scenario;
pub mod telemetry;

use clap::Parser;

fn main() -> anyhow::Result<()> {
    let cli = commands::Cli::parse();

    telemetry::init_telemetry(&cli.log_level, cli.json_logs)?;

    if let Err(e) = commands::execute(cli.command) {
        output::print_error(&format!("Error: {:#}", e));
        std::process::exit(1);
    }

    Ok(())
}
