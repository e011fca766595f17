//! Error types for bridge operations

use thiserror::Error;
use zedspi_core::Error as CoreError;

/// Bridge-specific errors
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Caller-supplied arguments violate a device contract; nothing was sent
    #[error("Invalid argument: {0}")]
    InvalidArgument(CoreError),

    /// A response frame started with the wrong opcode
    #[error("Protocol mismatch: expected opcode 0x{expected:02X}, found 0x{found:02X}")]
    ProtocolMismatch { expected: u8, found: u8 },

    /// No valid response before the transaction deadline
    #[error("Timed out waiting for response to opcode 0x{opcode:02X}")]
    Timeout { opcode: u8 },

    /// A bulk payload from the device stopped short
    #[error("Incomplete transfer: expected {expected} bytes, received {received}")]
    IncompleteTransfer { expected: usize, received: usize },

    /// Frame could not be decoded
    #[error("Frame error: {0}")]
    Codec(CoreError),

    /// Failed to open the link
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// I/O error during communication
    #[error("I/O error: {0}")]
    IoError(String),

    /// Serial port error
    #[cfg(feature = "serial")]
    #[error("Serial port error: {0}")]
    SerialError(#[from] serialport::Error),
}

impl BridgeError {
    /// Returns true if the operation was rejected before anything was sent
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument(_))
    }

    /// Returns true if the device did not answer in time
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

impl From<CoreError> for BridgeError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::UnexpectedOpcode { expected, found } => {
                BridgeError::ProtocolMismatch { expected, found }
            }
            CoreError::ShortPayload { expected, found } => BridgeError::IncompleteTransfer {
                expected,
                received: found,
            },
            e if e.is_invalid_argument() => BridgeError::InvalidArgument(e),
            e => BridgeError::Codec(e),
        }
    }
}

impl From<std::io::Error> for BridgeError {
    fn from(e: std::io::Error) -> Self {
        BridgeError::IoError(e.to_string())
    }
}

/// Result type for bridge operations
pub type Result<T> = std::result::Result<T, BridgeError>;
