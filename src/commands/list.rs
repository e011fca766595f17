//! List commands implementation

use crate::bridges;

/// List all bridge links compiled into this binary
pub fn list_bridges() {
    println!("Supported bridges:");
    println!();
    for bridge in bridges::available_bridges() {
        let name = if bridge.aliases.is_empty() {
            bridge.name.to_string()
        } else {
            format!("{} ({})", bridge.name, bridge.aliases.join(", "))
        };
        println!("  {:<16} - {}", name, bridge.description);
    }
}

/// List serial ports present on this host
#[cfg(feature = "serial")]
pub fn list_ports() -> Result<(), Box<dyn std::error::Error>> {
    let ports = zedspi_bridge::available_ports()?;
    if ports.is_empty() {
        println!("No serial ports found");
        return Ok(());
    }

    println!("{:<24} Type", "Port");
    println!("{}", "-".repeat(48));
    for port in ports {
        println!("{:<24} {}", port.name, port.kind);
    }
    Ok(())
}

/// List serial ports present on this host
#[cfg(not(feature = "serial"))]
pub fn list_ports() -> Result<(), Box<dyn std::error::Error>> {
    Err("Serial support not compiled in. Rebuild with --features serial".into())
}
