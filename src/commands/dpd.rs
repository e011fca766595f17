//! DPD actuator commands

use super::with_spinner;
use crate::bridges::AnyBridge;
use crate::iq_file;
use std::path::Path;

/// Run the dpd write command
pub fn run_dpd_write(
    bridge: &mut AnyBridge,
    address: u8,
    data: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    bridge.dpd_write(address, data)?;
    println!("DPD 0x{:02X} <- 0x{:08X}", address, data);
    Ok(())
}

/// Run the dpd read command
pub fn run_dpd_read(bridge: &mut AnyBridge, address: u8) -> Result<(), Box<dyn std::error::Error>> {
    let data = bridge.dpd_read(address)?;
    println!("DPD 0x{:02X}: 0x{:08X} ({})", address, data, data);
    Ok(())
}

/// Run the dpd lut-write command
pub fn run_dpd_lut_write(
    bridge: &mut AnyBridge,
    lut: u8,
    input: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let entries = iq_file::read_waveform_file(input)?;
    let message = format!("Loading LUT {}", lut);
    with_spinner(&message, || bridge.dpd_lut_write(lut, &entries))?;
    println!("Loaded LUT {} from {}", lut, input.display());
    Ok(())
}

/// Run the dpd lut-read command
pub fn run_dpd_lut_read(
    bridge: &mut AnyBridge,
    lut: u8,
    output: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let message = format!("Reading LUT {}", lut);
    let entries = with_spinner(&message, || bridge.dpd_lut_read(lut))?;
    iq_file::write_waveform_file(output, &entries)
        .map_err(|e| format!("Failed to write {}: {}", output.display(), e))?;
    println!("Wrote LUT {} ({} entries) to {}", lut, entries.len(), output.display());
    Ok(())
}
