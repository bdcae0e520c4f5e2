//! CLI Entry Point for stagectl
//!
//! Maintenance tool for the stages supported by `stage_control`:
//! - Listing the serial ports the host can see
//! - Probing for a stage (discover, initialize, release)
//! - Issuing a single move
//!
//! # Usage
//!
//! ```bash
//! stagectl ports
//! stagectl probe single-axis
//! stagectl --config stage.toml move piezo-mirror --axis 1 --distance 5.0
//! RUST_LOG=debug stagectl probe xyz-nanostage
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use stage_control::{StageController, StageKind, StageSettings};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "stagectl")]
#[command(about = "Discover and move precision stages", long_about = None)]
struct Cli {
    /// Settings file (TOML); STAGE_* environment variables override it
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List serial ports visible to this machine
    Ports,

    /// Discover and initialize a stage, then release it
    Probe {
        /// cryo-focus, single-axis, xyz-nanostage or piezo-mirror
        kind: StageKind,
    },

    /// Move one axis of a stage
    Move {
        /// cryo-focus, single-axis, xyz-nanostage or piezo-mirror
        kind: StageKind,

        /// 1-based axis (X/theta = 1, Y/phi = 2, Z = 3)
        #[arg(long)]
        axis: u32,

        /// Target position (um, or mirror units)
        #[arg(long, allow_negative_numbers = true)]
        distance: f64,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let settings = match &cli.config {
        Some(path) => StageSettings::load_from(path)
            .with_context(|| format!("Failed to load settings from {}", path.display()))?,
        None => StageSettings::load().context("Failed to load settings")?,
    };

    match cli.command {
        Commands::Ports => list_ports(),
        Commands::Probe { kind } => probe(kind, &settings),
        Commands::Move {
            kind,
            axis,
            distance,
        } => move_once(kind, axis, distance, &settings),
    }
}

#[cfg(feature = "instrument_serial")]
fn list_ports() -> Result<()> {
    use stage_control::adapters::{SerialPortProvider, SystemSerial};

    let ports = SystemSerial.port_names().context("Failed to enumerate serial ports")?;
    if ports.is_empty() {
        println!("No serial ports found");
    }
    for port in ports {
        println!("{}", port);
    }
    Ok(())
}

#[cfg(not(feature = "instrument_serial"))]
fn list_ports() -> Result<()> {
    Err(stage_control::StageError::FeatureNotEnabled("instrument_serial".into()).into())
}

fn probe(kind: StageKind, settings: &StageSettings) -> Result<()> {
    let stage = StageController::open(kind, settings)
        .with_context(|| format!("Failed to open {} stage", kind))?;
    info!("Opened {:?}", stage);
    println!("{}: {:?}", kind, stage.position());
    stage.close();
    Ok(())
}

fn move_once(kind: StageKind, axis: u32, distance: f64, settings: &StageSettings) -> Result<()> {
    let mut stage = StageController::open(kind, settings)
        .with_context(|| format!("Failed to open {} stage", kind))?;
    stage
        .move_to(distance, axis)
        .with_context(|| format!("Failed to move axis {} to {:.3}", axis, distance))?;
    println!("{}: {:?}", kind, stage.position());
    stage.close();
    Ok(())
}
