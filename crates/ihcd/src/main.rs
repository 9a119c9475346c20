//! `ihcd` -- bridge daemon between an LK IHC controller and a
//! home-automation hub.
//!
//! Wires the synchronization engine to its collaborators: the in-memory
//! device registry seeded from the configuration file, the upstream
//! logging sink, and the controller session (the deterministic simulator
//! in this build; a SOAP transport plugs into the same trait).

mod cli;
mod config;
mod error;
mod sim;

use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use ihcd_core::{Bridge, MemoryRegistry, SerialNumber, TracingSink};

use crate::cli::Cli;
use crate::config::Config;
use crate::error::CliError;
use crate::sim::SimSession;

fn init_tracing(filter_override: Option<&str>) {
    let filter = match filter_override {
        Some(filter) => EnvFilter::new(filter),
        None => EnvFilter::try_from_env("IHCD_LOG").unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Cli::parse();
    init_tracing(args.log.as_deref());

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "ihcd failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Cli) -> Result<(), CliError> {
    let config = Config::load(&args.config)?;
    if args.check {
        println!(
            "configuration OK ({} devices, {} watched)",
            config.devices.len(),
            config.devices.iter().filter(|d| d.watched).count()
        );
        return Ok(());
    }

    let serials: Vec<SerialNumber> = config
        .devices
        .iter()
        .filter_map(|entry| {
            SerialNumber::from_decimal(&entry.serial_number)
                .ok()
                .flatten()
        })
        .collect();
    let session = SimSession::new(&config.simulator, serials);
    let registry = MemoryRegistry::from_rows(config.devices.iter().map(config::DeviceEntry::to_row));

    let bridge = Bridge::new(config.engine.clone(), session, registry, TracingSink);
    bridge.start().await;
    info!(devices = config.devices.len(), "ihcd running - press Ctrl-C to stop");

    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    bridge.stop().await;

    let stats = bridge.stats();
    info!(
        cycles = stats.cycles,
        commands = stats.commands_delivered,
        faults = stats.faults,
        "bridge stopped"
    );
    Ok(())
}
