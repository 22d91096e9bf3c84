//! sprd-nand - SC88xx NAND controller driver on a simulated device
//!
//! Attaches the controller core to an in-memory NAND array and runs page,
//! block and spare-area operations through the same callback sequence the
//! generic NAND layer uses on hardware.
//!
//! # Architecture
//!
//! - `sprd-nand-core` - the controller: command/address tracking, command
//!   dispatch, data movement and hardware ECC
//! - `sprd-nand-sim` - the NFC register block and NAND array in memory,
//!   plus the page-level front end driving the controller callbacks
//!
//! The array can be backed by a raw image file (`--image`) so state
//! persists across invocations.

mod cli;
mod commands;
mod device;

use clap::Parser;
use cli::{Cli, Commands};
use device::open_device;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Set log level based on verbosity
    match cli.verbose {
        0 => {} // default (info)
        1 => log::set_max_level(log::LevelFilter::Debug),
        _ => log::set_max_level(log::LevelFilter::Trace),
    }

    let mut device = open_device(&cli.device)?;
    log::debug!(
        "Attached to '{}' ({} blocks)",
        device.profile.name,
        device.profile.blocks
    );

    match cli.command {
        Commands::Info => commands::info::run_info(&mut device),
        Commands::Status => commands::info::run_status(&mut device),
        Commands::Read {
            page,
            count,
            output,
        } => commands::read::run_read(&mut device, page, count, &output),
        Commands::Write { page, input } => commands::write::run_write(&mut device, page, &input),
        Commands::Erase { block, count } => commands::erase::run_erase(&mut device, block, count),
        Commands::ReadOob { page } => commands::oob::run_read_oob(&mut device, page),
        Commands::Flip { page, byte, bit } => {
            commands::flip::run_flip(&mut device, page, byte, bit)
        }
    }
}
