//! zedspi-core - Frame codec for the SPI bridge control protocol
//!
//! The bridge firmware accepts fixed 10-byte command frames over a serial
//! link and forwards register accesses to the RF transceiver's SPI bus. Bulk
//! transfers (waveform download, capture read, DPD lookup tables) start with
//! a 10-byte header frame followed by a raw, unframed payload.
//!
//! This crate holds everything that does not touch a transport:
//!
//! - [`protocol`] - opcode table and device limits
//! - [`frame`] - encoding/decoding of the 10-byte frames
//! - [`sample`] - I/Q sample pairs and bulk payload packing
//!
//! It is `no_std` and allocation free so the same codec can be reused on the
//! device side.
//!
//! # Example
//!
//! ```
//! use zedspi_core::frame::{Frame, RegisterAccess};
//!
//! let frame = Frame::RegisterRead(RegisterAccess::request(0, 0x000A));
//! assert_eq!(frame.encode(), [0x5B, 0, 0, 0, 0, 0x0A, 0, 0, 0, 0]);
//! ```

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod error;
pub mod frame;
pub mod protocol;
pub mod sample;

pub use error::{Error, Result};
pub use frame::{BulkLength, Frame, RawFrame, RegisterAccess};
pub use sample::SamplePair;
