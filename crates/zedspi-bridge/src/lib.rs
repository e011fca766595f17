//! zedspi-bridge - Host side of the serial SPI bridge protocol
//!
//! This crate drives the bridge firmware over a byte channel: register
//! writes and reads on the transceiver's SPI bus, waveform downloads,
//! capture reads, stored waveform selection and DPD actuator access.
//!
//! # Protocol Overview
//!
//! Every command is a fixed 10-byte frame (see [`zedspi_core::frame`]).
//! Only register reads are answered with a frame; there are no request IDs,
//! so one transaction is in flight at a time. Bulk transfers send a header
//! frame, wait a settle interval, then move a raw payload.
//!
//! # Example
//!
//! ```no_run
//! use zedspi_bridge::{Bridge, SerialChannel};
//!
//! let channel = SerialChannel::open("/dev/ttyUSB0", Some(115200))?;
//! let mut bridge = Bridge::new(channel);
//!
//! bridge.write(0, 0x000A, 0x12)?;
//! let value = bridge.read(0, 0x000A)?;
//! println!("0x000A = 0x{:02X}", value);
//!
//! let capture = bridge.read_capture(1024)?;
//! println!("captured {} samples", capture.len());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod device;
pub mod error;
pub mod transport;

// Re-exports
pub use config::{ResponsePolicy, Timing};
pub use device::{stored_file_name, Bridge};
pub use error::{BridgeError, Result};
pub use transport::Channel;
pub use zedspi_core::SamplePair;

#[cfg(feature = "serial")]
pub use transport::serial::{available_ports, PortDescription, SerialChannel};

/// Serial connection options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialOptions {
    /// Device path (e.g., "/dev/ttyUSB0" or "COM3")
    pub device: String,
    /// Baud rate (None for the firmware default of 115200)
    pub baud: Option<u32>,
}

impl SerialOptions {
    /// Parse a connection string
    ///
    /// Formats:
    /// - `dev=/dev/ttyUSB0` - Serial with default baud
    /// - `dev=/dev/ttyUSB0:115200` - Serial with specified baud
    pub fn parse(s: &str) -> std::result::Result<Self, String> {
        let dev = s
            .strip_prefix("dev=")
            .ok_or_else(|| format!("Invalid serial connection string: {}. Use dev=...", s))?;
        if dev.is_empty() {
            return Err("Missing device in dev= parameter".to_string());
        }

        if let Some((device, baud_str)) = dev.rsplit_once(':') {
            let baud = baud_str
                .parse()
                .map_err(|_| format!("Invalid baud rate: {}", baud_str))?;
            Ok(SerialOptions {
                device: device.to_string(),
                baud: Some(baud),
            })
        } else {
            Ok(SerialOptions {
                device: dev.to_string(),
                baud: None,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_serial_default_baud() {
        let opts = SerialOptions::parse("dev=/dev/ttyUSB0").unwrap();
        assert_eq!(opts.device, "/dev/ttyUSB0");
        assert_eq!(opts.baud, None);
    }

    #[test]
    fn test_parse_serial_with_baud() {
        let opts = SerialOptions::parse("dev=COM3:921600").unwrap();
        assert_eq!(opts.device, "COM3");
        assert_eq!(opts.baud, Some(921600));
    }

    #[test]
    fn test_parse_serial_errors() {
        assert!(SerialOptions::parse("ip=localhost:1234").is_err());
        assert!(SerialOptions::parse("dev=").is_err());
        assert!(SerialOptions::parse("dev=/dev/ttyUSB0:fast").is_err());
    }
}
