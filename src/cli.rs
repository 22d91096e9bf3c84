//! CLI argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Parse a string as a hex or decimal u32
fn parse_hex_u32(s: &str) -> Result<u32, String> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).map_err(|e| format!("Invalid hex value: {}", e))
    } else {
        s.parse::<u32>().map_err(|e| format!("Invalid number: {}", e))
    }
}

#[derive(Parser)]
#[command(name = "sprd-nand")]
#[command(author, version, about = "SC88xx NAND controller on a simulated device", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(flatten)]
    pub device: DeviceArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Simulated device selection, shared by every command
#[derive(clap::Args, Debug, Clone)]
pub struct DeviceArgs {
    /// Device profile (RON format)
    #[arg(long, global = true, conflicts_with = "preset")]
    pub profile: Option<PathBuf>,

    /// Built-in device profile
    #[arg(long, global = true, default_value = "large", value_parser = ["large", "small"])]
    pub preset: String,

    /// Raw array image backing the device; created on first write
    #[arg(long, global = true)]
    pub image: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show device ID and geometry
    Info,

    /// Show the device status register
    Status,

    /// Read pages (ECC corrected) to a file
    Read {
        /// First page (hex or decimal)
        #[arg(long, value_parser = parse_hex_u32)]
        page: u32,

        /// Number of pages
        #[arg(long, default_value = "1", value_parser = parse_hex_u32)]
        count: u32,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Program pages from a file
    Write {
        /// First page (hex or decimal)
        #[arg(long, value_parser = parse_hex_u32)]
        page: u32,

        /// Input file path; a partial last page is padded with 0xFF
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Erase blocks
    Erase {
        /// First block (hex or decimal)
        #[arg(long, value_parser = parse_hex_u32)]
        block: u32,

        /// Number of blocks
        #[arg(long, default_value = "1", value_parser = parse_hex_u32)]
        count: u32,
    },

    /// Dump the spare area of a page
    ReadOob {
        /// Page (hex or decimal)
        #[arg(long, value_parser = parse_hex_u32)]
        page: u32,
    },

    /// Invert one stored bit to inject an error
    Flip {
        /// Page (hex or decimal)
        #[arg(long, value_parser = parse_hex_u32)]
        page: u32,

        /// Byte within the raw page (data then spare)
        #[arg(long, value_parser = parse_hex_u32)]
        byte: u32,

        /// Bit within the byte (0-7)
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..8))]
        bit: u8,
    },
}
