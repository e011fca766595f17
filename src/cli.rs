//! CLI argument parsing

use crate::bridges;
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

/// Parse a string as a hex or decimal u8
fn parse_hex_u8(s: &str) -> Result<u8, String> {
    let value = parse_hex_u32(s)?;
    u8::try_from(value).map_err(|_| format!("Value out of range (0..=255): {}", s))
}

/// Generate dynamic help text for the bridge argument
fn bridge_help() -> String {
    format!(
        "Bridge link to use [available: {}] (default: from --config)",
        bridges::bridge_names_short()
    )
}

#[derive(Parser)]
#[command(name = "zedspi")]
#[command(author, version, about = "SPI bridge control over a serial link", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Configuration file (TOML format)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Link options shared across commands
#[derive(clap::Args, Debug, Clone, Default)]
pub struct LinkArgs {
    /// Bridge link, e.g. serial:dev=/dev/ttyUSB0[:baud] or dummy
    #[arg(short, long, help = bridge_help())]
    pub bridge: Option<String>,

    /// Response deadline in milliseconds
    #[arg(long)]
    pub response_timeout: Option<u64>,

    /// Wait between a download header and its payload, in milliseconds
    #[arg(long)]
    pub waveform_settle: Option<u64>,

    /// Fixed wait before reading a capture, in milliseconds
    #[arg(long)]
    pub capture_settle: Option<u64>,

    /// Handling of misaligned responses (resync, discard, strict)
    #[arg(long)]
    pub policy: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List supported bridge links
    ListBridges,

    /// List serial ports present on this host
    ListPorts,

    /// Write an SPI register
    Write {
        #[command(flatten)]
        link: LinkArgs,

        /// Access mode (target device selector)
        #[arg(short, long, value_parser = parse_hex_u8)]
        mode: u8,

        /// Register address (hex, e.g., 0x1000)
        #[arg(short, long, value_parser = parse_hex_u32)]
        address: u32,

        /// Value to write (hex or decimal)
        #[arg(short, long, value_parser = parse_hex_u32)]
        data: u32,
    },

    /// Read an SPI register
    Read {
        #[command(flatten)]
        link: LinkArgs,

        /// Access mode (target device selector)
        #[arg(short, long, value_parser = parse_hex_u8)]
        mode: u8,

        /// Register address (hex, e.g., 0x1000)
        #[arg(short, long, value_parser = parse_hex_u32)]
        address: u32,
    },

    /// Download a waveform file to the DAC buffer
    Download {
        #[command(flatten)]
        link: LinkArgs,

        /// Waveform file (one 0xIIIIQQQQ sample per line)
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Capture ADC samples to a file
    Capture {
        #[command(flatten)]
        link: LinkArgs,

        /// Number of sample pairs to capture
        #[arg(short, long, default_value_t = 16384)]
        samples: usize,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Play a waveform stored on the device card
    SelectFile {
        #[command(flatten)]
        link: LinkArgs,

        /// Stored file index (TEST<index>.BIN)
        #[arg(short, long, value_parser = parse_hex_u8)]
        index: u8,

        /// File size in bytes
        #[arg(short, long, value_parser = parse_hex_u32)]
        size: u32,
    },

    /// DPD actuator operations
    #[command(subcommand)]
    Dpd(DpdCommands),
}

/// DPD-related subcommands
#[derive(Subcommand)]
pub enum DpdCommands {
    /// Write a DPD actuator register
    Write {
        #[command(flatten)]
        link: LinkArgs,

        /// Register address
        #[arg(short, long, value_parser = parse_hex_u8)]
        address: u8,

        /// Value to write (hex or decimal)
        #[arg(short, long, value_parser = parse_hex_u32)]
        data: u32,
    },

    /// Read a DPD actuator register
    Read {
        #[command(flatten)]
        link: LinkArgs,

        /// Register address
        #[arg(short, long, value_parser = parse_hex_u8)]
        address: u8,
    },

    /// Load a lookup table from a waveform-format file
    LutWrite {
        #[command(flatten)]
        link: LinkArgs,

        /// Lookup table index
        #[arg(short, long, value_parser = parse_hex_u8)]
        lut: u8,

        /// Table file (512 lines of 0xIIIIQQQQ)
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Read a lookup table to a waveform-format file
    LutRead {
        #[command(flatten)]
        link: LinkArgs,

        /// Lookup table index
        #[arg(short, long, value_parser = parse_hex_u8)]
        lut: u8,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,
    },
}
