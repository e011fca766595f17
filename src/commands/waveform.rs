//! Waveform download and stored file selection

use super::with_spinner;
use crate::bridges::AnyBridge;
use crate::iq_file;
use std::path::Path;
use zedspi_bridge::stored_file_name;

/// Run the download command
pub fn run_download(bridge: &mut AnyBridge, input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let samples = iq_file::read_waveform_file(input)?;
    if samples.is_empty() {
        return Err(format!("{}: no samples found", input.display()).into());
    }

    let message = format!("Downloading {} samples", samples.len());
    with_spinner(&message, || bridge.download_pairs(&samples))?;

    println!("Downloaded {} samples from {}", samples.len(), input.display());
    Ok(())
}

/// Run the select-file command
pub fn run_select_file(
    bridge: &mut AnyBridge,
    index: u8,
    size: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    bridge.select_stored_waveform(index, size)?;
    println!("Selected {} ({} bytes)", stored_file_name(index), size);
    Ok(())
}
