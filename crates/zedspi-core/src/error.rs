//! Error types for zedspi-core
//!
//! This module provides a no_std compatible error type shared by the codec
//! and the transfer helpers built on top of it.

use core::fmt;

/// Core error type - no_std compatible, Copy for efficiency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    // Argument errors
    /// I and Q sequences of a waveform differ in length
    ChannelLengthMismatch {
        /// Number of I samples
        i: usize,
        /// Number of Q samples
        q: usize,
    },
    /// More samples requested than the device buffer holds
    TooManySamples {
        /// Requested sample count
        requested: usize,
        /// Device limit
        max: usize,
    },
    /// Payload byte length does not fit the 24-bit length field
    LengthOverflow(usize),
    /// DPD lookup table index beyond the actuator's table count
    LutIndexOutOfRange(u8),
    /// DPD lookup table data does not have exactly one entry per table row
    LutDepthMismatch(usize),

    // Decode errors
    /// Leading byte is not a known opcode
    UnknownOpcode(u8),
    /// Leading byte is a valid opcode, but not the one the transaction expects
    UnexpectedOpcode {
        /// Opcode the transaction waits for
        expected: u8,
        /// Opcode found in the frame
        found: u8,
    },
    /// Bulk payload is shorter than its header announced
    ShortPayload {
        /// Announced byte count
        expected: usize,
        /// Bytes actually available
        found: usize,
    },
}

impl Error {
    /// Returns true for errors caused by caller-supplied arguments
    ///
    /// These are detected before anything is sent to the device.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(
            self,
            Self::ChannelLengthMismatch { .. }
                | Self::TooManySamples { .. }
                | Self::LengthOverflow(_)
                | Self::LutIndexOutOfRange(_)
                | Self::LutDepthMismatch(_)
        )
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ChannelLengthMismatch { i, q } => write!(
                f,
                "I and Q must have the same length (I: {}, Q: {})",
                i, q
            ),
            Self::TooManySamples { requested, max } => write!(
                f,
                "sample count {} exceeds device limit of {}",
                requested, max
            ),
            Self::LengthOverflow(len) => {
                write!(f, "payload of {} bytes does not fit a 24-bit length", len)
            }
            Self::LutIndexOutOfRange(id) => write!(f, "DPD LUT index {} out of range", id),
            Self::LutDepthMismatch(n) => {
                write!(
                    f,
                    "DPD LUT needs exactly {} entries, got {}",
                    crate::protocol::DPD_LUT_DEPTH,
                    n
                )
            }
            Self::UnknownOpcode(op) => write!(f, "unknown opcode 0x{:02X}", op),
            Self::UnexpectedOpcode { expected, found } => write!(
                f,
                "expected opcode 0x{:02X}, found 0x{:02X}",
                expected, found
            ),
            Self::ShortPayload { expected, found } => write!(
                f,
                "payload too short: expected {} bytes, found {}",
                expected, found
            ),
        }
    }
}

#[cfg(any(test, feature = "std"))]
impl std::error::Error for Error {}

/// Result type alias using the core Error type
pub type Result<T> = core::result::Result<T, Error>;
