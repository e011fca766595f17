//! zedspi - control an SPI bridge over a serial link
//!
//! The bridge firmware exposes register access to the devices on its SPI
//! bus, a DAC waveform buffer, ADC captures, waveforms stored on its card
//! and a DPD actuator. Every operation is a fixed 10-byte frame, optionally
//! followed by a raw sample payload.

mod bridges;
mod cli;
mod commands;
mod config;
mod iq_file;

use clap::Parser;
use cli::{Cli, Commands, DpdCommands, LinkArgs};
use config::ConfigFile;

fn main() {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Set log level based on verbosity
    match cli.verbose {
        0 => {} // default (info)
        1 => log::set_max_level(log::LevelFilter::Debug),
        _ => log::set_max_level(log::LevelFilter::Trace),
    }

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = match &cli.config {
        Some(path) => ConfigFile::load(path)?,
        None => ConfigFile::default(),
    };

    match cli.command {
        Commands::ListBridges => {
            commands::list_bridges();
            Ok(())
        }
        Commands::ListPorts => commands::list_ports(),
        Commands::Write {
            link,
            mode,
            address,
            data,
        } => {
            let mut bridge = open(&config, &link)?;
            commands::run_write(&mut bridge, mode, address, data)
        }
        Commands::Read {
            link,
            mode,
            address,
        } => {
            let mut bridge = open(&config, &link)?;
            commands::run_read(&mut bridge, mode, address)
        }
        Commands::Download { link, input } => {
            let mut bridge = open(&config, &link)?;
            commands::run_download(&mut bridge, &input)
        }
        Commands::Capture {
            link,
            samples,
            output,
        } => {
            let mut bridge = open(&config, &link)?;
            commands::run_capture(&mut bridge, samples, &output)
        }
        Commands::SelectFile { link, index, size } => {
            let mut bridge = open(&config, &link)?;
            commands::run_select_file(&mut bridge, index, size)
        }
        Commands::Dpd(subcmd) => match subcmd {
            DpdCommands::Write {
                link,
                address,
                data,
            } => {
                let mut bridge = open(&config, &link)?;
                commands::run_dpd_write(&mut bridge, address, data)
            }
            DpdCommands::Read { link, address } => {
                let mut bridge = open(&config, &link)?;
                commands::run_dpd_read(&mut bridge, address)
            }
            DpdCommands::LutWrite { link, lut, input } => {
                let mut bridge = open(&config, &link)?;
                commands::run_dpd_lut_write(&mut bridge, lut, &input)
            }
            DpdCommands::LutRead { link, lut, output } => {
                let mut bridge = open(&config, &link)?;
                commands::run_dpd_lut_read(&mut bridge, lut, &output)
            }
        },
    }
}

/// Open the bridge named by the flags or the configuration file
fn open(config: &ConfigFile, link: &LinkArgs) -> Result<bridges::AnyBridge, Box<dyn std::error::Error>> {
    let settings = config.resolve(link)?;
    bridges::open_bridge(&settings.bridge, settings.timing)
}
