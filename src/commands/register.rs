//! Register read/write commands

use crate::bridges::AnyBridge;

/// Run the write command
pub fn run_write(
    bridge: &mut AnyBridge,
    mode: u8,
    address: u32,
    data: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    bridge
        .write(mode, address, data)
        .map_err(|e| format!("Write to 0x{:08X} failed: {}", address, e))?;
    println!("Wrote 0x{:08X} to 0x{:08X} (mode {})", data, address, mode);
    Ok(())
}

/// Run the read command
pub fn run_read(
    bridge: &mut AnyBridge,
    mode: u8,
    address: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    let data = bridge
        .read(mode, address)
        .map_err(|e| format!("Read from 0x{:08X} failed: {}", address, e))?;
    println!("0x{:08X}: 0x{:08X} ({})", address, data, data);
    Ok(())
}
