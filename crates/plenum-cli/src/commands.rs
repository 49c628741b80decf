//! CLI command implementations.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use colored::Colorize;
use plenum_governance::{Deployment, DeploymentConfig};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::output::*;
use crate::scenario::{Scenario, ScenarioRunner};

/// Main CLI.
#[derive(Parser, Debug)]
#[command(name = "plenum")]
#[command(about = "Plenum - token-weighted governance simulator")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Log filter directive (e.g. "info" or "plenum_governance=debug")
    #[arg(long, global = true, default_value = "warn", env = "PLENUM_LOG")]
    pub log_level: String,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write the default deployment configuration
    Init {
        /// Output file
        #[arg(short, long, default_value = "deployment.toml")]
        out: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Replay a scenario against a fresh deployment
    Simulate {
        /// Deployment configuration (defaults are used when omitted)
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Scenario script
        #[arg(short, long, value_name = "FILE")]
        script: PathBuf,

        /// Print events as JSON lines
        #[arg(long)]
        events_json: bool,
    },
}

/// Execute a parsed command.
pub fn execute(cmd: Commands) -> anyhow::Result<()> {
    match cmd {
        Commands::Init { out, force } => execute_init(&out, force),
        Commands::Simulate {
            config,
            script,
            events_json,
        } => execute_simulate(config.as_deref(), &script, events_json),
    }
}

fn execute_init(out: &Path, force: bool) -> anyhow::Result<()> {
    if out.exists() {
        if !force {
            bail!("{} already exists (use --force to overwrite)", out.display());
        }
        print_warning(&format!("Overwriting {}", out.display()));
    }

    DeploymentConfig::default().to_file(out)?;
    print_success(&format!("Wrote default deployment to {}", out.display()));
    Ok(())
}

fn execute_simulate(config: Option<&Path>, script: &Path, events_json: bool) -> anyhow::Result<()> {
    let config = match config {
        Some(path) => {
            info!("Loading deployment from: {:?}", path);
            DeploymentConfig::from_file(path)?
        }
        None => {
            info!("Using default deployment");
            DeploymentConfig::default()
        }
    };
    let scenario = Scenario::from_file(script)?;

    let deployment = Deployment::new(&config).context("Failed to deploy")?;
    print_info(&format!(
        "Governor {} at {}, token {} at {}",
        config.governor.name,
        deployment.governor_address(),
        config.token.symbol,
        deployment.token_address()
    ));

    let mut runner = ScenarioRunner::new(deployment);
    let reports = runner.run(&scenario);
    for report in &reports {
        print_step(report, events_json)?;
    }

    println!();
    println!("{}", "Proposals".bold());
    print_proposal_table(runner.deployment().governor());

    let token = runner.deployment().token().read();
    print_info(&format!(
        "Height {}, total supply {} {}",
        runner.deployment().clock().current(),
        format_amount(token.total_supply(), token.decimals()),
        token.symbol()
    ));
    drop(token);

    if let Some(failed) = reports.iter().find(|r| r.outcome.is_unexpected()) {
        bail!(
            "Scenario failed at step {} ({}); {} of {} steps replayed",
            failed.index,
            failed.action,
            reports.len(),
            scenario.steps.len()
        );
    }

    print_success(&format!("All {} steps behaved as scripted", reports.len()));
    Ok(())
}
