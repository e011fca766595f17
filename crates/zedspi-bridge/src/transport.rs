//! Byte channel abstraction for bridge communication
//!
//! The protocol only needs an ordered, reliable byte stream with a "bytes
//! pending" query. The serial port is the real link; tests and the CLI's
//! `dummy` bridge plug in an emulated device instead.

use crate::error::Result;
use std::time::Duration;

/// Byte channel trait for reading and writing bytes
pub trait Channel {
    /// Write all bytes to the channel
    fn write(&mut self, data: &[u8]) -> Result<()>;

    /// Flush any buffered data
    fn flush(&mut self) -> Result<()>;

    /// Number of received bytes that can be read without blocking
    fn bytes_available(&mut self) -> Result<usize>;

    /// Read exactly `buf.len()` bytes, blocking until they arrive
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<()>;

    /// Read with a bounded wait
    ///
    /// Reads up to `buf.len()` bytes, waiting at most `timeout` for the first
    /// one. Returns the number of bytes read, or 0 on timeout.
    fn read_timeout(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize>;

    /// Drain everything currently received into `out`
    ///
    /// Returns the number of bytes appended. Does not wait for more data.
    fn read_available(&mut self, out: &mut Vec<u8>) -> Result<usize> {
        let pending = self.bytes_available()?;
        if pending > 0 {
            let start = out.len();
            out.resize(start + pending, 0);
            self.read_exact(&mut out[start..])?;
        }
        Ok(pending)
    }
}

impl<C: Channel + ?Sized> Channel for Box<C> {
    fn write(&mut self, data: &[u8]) -> Result<()> {
        (**self).write(data)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }

    fn bytes_available(&mut self) -> Result<usize> {
        (**self).bytes_available()
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        (**self).read_exact(buf)
    }

    fn read_timeout(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize> {
        (**self).read_timeout(buf, timeout)
    }

    fn read_available(&mut self, out: &mut Vec<u8>) -> Result<usize> {
        (**self).read_available(out)
    }
}

#[cfg(feature = "serial")]
pub mod serial {
    //! Serial port channel implementation

    use super::*;
    use crate::error::BridgeError;
    use serialport::{DataBits, FlowControl, Parity, SerialPort, SerialPortType, StopBits};
    use std::io::{Read, Write};
    use zedspi_core::protocol::DEFAULT_BAUD_RATE;

    /// Channel-level read timeout, separate from the transaction deadline
    const PORT_TIMEOUT: Duration = Duration::from_secs(1);

    /// Serial port channel
    pub struct SerialChannel {
        port: Box<dyn SerialPort>,
    }

    impl SerialChannel {
        /// Open a serial port at the given baud rate (115200 if `None`), 8N1
        pub fn open(device: &str, baud: Option<u32>) -> Result<Self> {
            let baud_rate = baud.unwrap_or(DEFAULT_BAUD_RATE);

            let port = serialport::new(device, baud_rate)
                .data_bits(DataBits::Eight)
                .parity(Parity::None)
                .stop_bits(StopBits::One)
                .flow_control(FlowControl::None)
                .timeout(PORT_TIMEOUT)
                .open()
                .map_err(|e| BridgeError::ConnectionFailed(format!("{}: {}", device, e)))?;

            log::info!("Opened serial port {} at {} baud", device, baud_rate);

            Ok(Self { port })
        }
    }

    impl Channel for SerialChannel {
        fn write(&mut self, data: &[u8]) -> Result<()> {
            self.port.write_all(data)?;
            Ok(())
        }

        fn flush(&mut self) -> Result<()> {
            self.port.flush()?;
            Ok(())
        }

        fn bytes_available(&mut self) -> Result<usize> {
            Ok(self.port.bytes_to_read()? as usize)
        }

        fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
            self.port.read_exact(buf)?;
            Ok(())
        }

        fn read_timeout(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize> {
            // Set temporary timeout
            let old_timeout = self.port.timeout();
            self.port.set_timeout(timeout)?;

            let result = match self.port.read(buf) {
                Ok(n) => Ok(n),
                Err(e) if e.kind() == std::io::ErrorKind::TimedOut => Ok(0),
                Err(e) => Err(BridgeError::from(e)),
            };

            // Restore timeout
            self.port.set_timeout(old_timeout)?;
            result
        }
    }

    /// A serial port found on the host
    #[derive(Debug, Clone)]
    pub struct PortDescription {
        /// Device path or name (e.g. `/dev/ttyUSB0`, `COM3`)
        pub name: String,
        /// What kind of port it is
        pub kind: String,
    }

    /// Enumerate the serial ports present on the host
    pub fn available_ports() -> Result<Vec<PortDescription>> {
        let ports = serialport::available_ports()?;
        Ok(ports
            .into_iter()
            .map(|p| {
                let kind = match p.port_type {
                    SerialPortType::UsbPort(usb) => {
                        let mut kind = format!("USB {:04x}:{:04x}", usb.vid, usb.pid);
                        if let Some(product) = usb.product {
                            kind.push(' ');
                            kind.push_str(&product);
                        }
                        kind
                    }
                    SerialPortType::PciPort => "PCI".to_string(),
                    SerialPortType::BluetoothPort => "Bluetooth".to_string(),
                    SerialPortType::Unknown => "unknown".to_string(),
                };
                PortDescription {
                    name: p.port_name,
                    kind,
                }
            })
            .collect())
    }
}
