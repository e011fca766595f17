//! Frame codec
//!
//! Every command and response is exactly [`FRAME_LEN`] bytes:
//!
//! ```text
//! register / dpd register  [op][mode][address: 4 BE][data: 4 BE]
//! waveform / capture       [op][length: 3 BE][0 0 0 0 0 0]
//! dpd lut write / read     [op][length: 3 BE][lut id][0 0 0 0 0]
//! file select              [op][index][size: 4 BE][0 0 0 0]
//! ```
//!
//! There is no checksum; integrity relies on the serial link. Padding bytes
//! are written as zero and ignored when decoding, like the firmware does.

use crate::error::{Error, Result};
use crate::protocol::*;

/// One serialized frame
pub type RawFrame = [u8; FRAME_LEN];

/// Payload of the register-style frames (`0x5A`, `0x5B`, `0x6A`, `0x6B`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RegisterAccess {
    /// Access mode byte, passed through to the device
    pub mode: u8,
    /// Register address
    pub address: u32,
    /// Register value (zero in read requests)
    pub data: u32,
}

impl RegisterAccess {
    /// Create a register access carrying a value
    pub const fn new(mode: u8, address: u32, data: u32) -> Self {
        Self {
            mode,
            address,
            data,
        }
    }

    /// Create a read request, with the data field reserved as zero
    pub const fn request(mode: u8, address: u32) -> Self {
        Self::new(mode, address, 0)
    }

    fn encode_into(&self, opcode: u8, buf: &mut RawFrame) {
        buf[0] = opcode;
        buf[1] = self.mode;
        buf[2..6].copy_from_slice(&self.address.to_be_bytes());
        buf[6..10].copy_from_slice(&self.data.to_be_bytes());
    }

    fn decode_from(buf: &RawFrame) -> Self {
        Self {
            mode: buf[1],
            address: u32::from_be_bytes([buf[2], buf[3], buf[4], buf[5]]),
            data: u32::from_be_bytes([buf[6], buf[7], buf[8], buf[9]]),
        }
    }
}

/// Byte count of a bulk payload, guaranteed to fit the 24-bit length field
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct BulkLength(u32);

impl BulkLength {
    /// Validate a payload byte count
    pub fn new(bytes: usize) -> Result<Self> {
        if bytes > MAX_BULK_LEN as usize {
            return Err(Error::LengthOverflow(bytes));
        }
        Ok(Self(bytes as u32))
    }

    /// Byte count of `count` I/Q sample pairs
    pub fn for_samples(count: usize) -> Result<Self> {
        let bytes = count
            .checked_mul(BYTES_PER_SAMPLE)
            .ok_or(Error::LengthOverflow(usize::MAX))?;
        Self::new(bytes)
    }

    /// Byte count
    pub const fn bytes(self) -> usize {
        self.0 as usize
    }

    /// Number of whole sample pairs covered by this length
    pub const fn samples(self) -> usize {
        self.0 as usize / BYTES_PER_SAMPLE
    }

    fn to_be_bytes(self) -> [u8; 3] {
        let b = self.0.to_be_bytes();
        [b[1], b[2], b[3]]
    }

    fn from_be_bytes(b: [u8; 3]) -> Self {
        Self(u32::from_be_bytes([0, b[0], b[1], b[2]]))
    }
}

/// A decoded protocol frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frame {
    /// `0x5A` transceiver register write
    RegisterWrite(RegisterAccess),
    /// `0x5B` transceiver register read request or response
    RegisterRead(RegisterAccess),
    /// `0x5C` waveform download header
    WaveformHeader(BulkLength),
    /// `0x5D` capture request
    CaptureRequest(BulkLength),
    /// `0x5E` select a stored waveform file
    FileSelect {
        /// File index, mapped by the device to `TEST<index>.BIN`
        index: u8,
        /// File size in bytes
        size: u32,
    },
    /// `0x6A` DPD actuator register write
    DpdWrite(RegisterAccess),
    /// `0x6B` DPD actuator register read request or response
    DpdRead(RegisterAccess),
    /// `0x6C` DPD lookup table write header
    DpdLutWrite {
        /// Payload byte count
        length: BulkLength,
        /// Lookup table index
        lut_id: u8,
    },
    /// `0x6D` DPD lookup table read request
    DpdLutRead {
        /// Payload byte count
        length: BulkLength,
        /// Lookup table index
        lut_id: u8,
    },
}

impl Frame {
    /// Leading byte of this frame
    pub fn opcode(&self) -> u8 {
        match self {
            Self::RegisterWrite(_) => OP_REG_WRITE,
            Self::RegisterRead(_) => OP_REG_READ,
            Self::WaveformHeader(_) => OP_WAVEFORM,
            Self::CaptureRequest(_) => OP_CAPTURE,
            Self::FileSelect { .. } => OP_FILE_SELECT,
            Self::DpdWrite(_) => OP_DPD_WRITE,
            Self::DpdRead(_) => OP_DPD_READ,
            Self::DpdLutWrite { .. } => OP_DPD_LUT_WRITE,
            Self::DpdLutRead { .. } => OP_DPD_LUT_READ,
        }
    }

    /// Serialize into the 10-byte wire format
    pub fn encode(&self) -> RawFrame {
        let mut buf = [0u8; FRAME_LEN];
        let opcode = self.opcode();
        match self {
            Self::RegisterWrite(access)
            | Self::RegisterRead(access)
            | Self::DpdWrite(access)
            | Self::DpdRead(access) => access.encode_into(opcode, &mut buf),
            Self::WaveformHeader(length) | Self::CaptureRequest(length) => {
                buf[0] = opcode;
                buf[1..4].copy_from_slice(&length.to_be_bytes());
            }
            Self::DpdLutWrite { length, lut_id } | Self::DpdLutRead { length, lut_id } => {
                buf[0] = opcode;
                buf[1..4].copy_from_slice(&length.to_be_bytes());
                buf[4] = *lut_id;
            }
            Self::FileSelect { index, size } => {
                buf[0] = opcode;
                buf[1] = *index;
                buf[2..6].copy_from_slice(&size.to_be_bytes());
            }
        }
        buf
    }

    /// Parse a 10-byte frame
    pub fn decode(buf: &RawFrame) -> Result<Self> {
        let length = || BulkLength::from_be_bytes([buf[1], buf[2], buf[3]]);
        let frame = match buf[0] {
            OP_REG_WRITE => Self::RegisterWrite(RegisterAccess::decode_from(buf)),
            OP_REG_READ => Self::RegisterRead(RegisterAccess::decode_from(buf)),
            OP_WAVEFORM => Self::WaveformHeader(length()),
            OP_CAPTURE => Self::CaptureRequest(length()),
            OP_FILE_SELECT => Self::FileSelect {
                index: buf[1],
                size: u32::from_be_bytes([buf[2], buf[3], buf[4], buf[5]]),
            },
            OP_DPD_WRITE => Self::DpdWrite(RegisterAccess::decode_from(buf)),
            OP_DPD_READ => Self::DpdRead(RegisterAccess::decode_from(buf)),
            OP_DPD_LUT_WRITE => Self::DpdLutWrite {
                length: length(),
                lut_id: buf[4],
            },
            OP_DPD_LUT_READ => Self::DpdLutRead {
                length: length(),
                lut_id: buf[4],
            },
            op => return Err(Error::UnknownOpcode(op)),
        };
        Ok(frame)
    }
}

/// Decode a register read response
///
/// Only a frame whose leading byte equals `expected` (the opcode of the
/// request) is a response to the pending transaction.
pub fn decode_response(expected: u8, buf: &RawFrame) -> Result<RegisterAccess> {
    if buf[0] != expected {
        return Err(Error::UnexpectedOpcode {
            expected,
            found: buf[0],
        });
    }
    Ok(RegisterAccess::decode_from(buf))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_write_layout() {
        let frame = Frame::RegisterWrite(RegisterAccess::new(0, 0x000A, 0x12));
        assert_eq!(
            frame.encode(),
            [0x5A, 0x00, 0x00, 0x00, 0x00, 0x0A, 0x00, 0x00, 0x00, 0x12]
        );
    }

    #[test]
    fn test_register_read_request_zeroes_data() {
        let frame = Frame::RegisterRead(RegisterAccess::request(3, 0xDEAD_BEEF));
        assert_eq!(
            frame.encode(),
            [0x5B, 0x03, 0xDE, 0xAD, 0xBE, 0xEF, 0x00, 0x00, 0x00, 0x00]
        );
    }

    #[test]
    fn test_response_roundtrip() {
        let cases = [
            (0u8, 0u32, 0u32),
            (255, u32::MAX, u32::MAX),
            (7, 0x0102_0304, 0xA1B2_C3E4),
            (128, 0x8000_0000, 1),
        ];
        for (mode, address, data) in cases {
            let raw = Frame::RegisterRead(RegisterAccess::new(mode, address, data)).encode();
            let access = decode_response(OP_REG_READ, &raw).unwrap();
            assert_eq!(access, RegisterAccess::new(mode, address, data));
        }
    }

    #[test]
    fn test_response_wrong_opcode() {
        let mut raw = Frame::RegisterRead(RegisterAccess::new(0, 1, 2)).encode();
        raw[0] = 0x5A;
        assert_eq!(
            decode_response(OP_REG_READ, &raw),
            Err(Error::UnexpectedOpcode {
                expected: 0x5B,
                found: 0x5A
            })
        );
    }

    #[test]
    fn test_header_layout() {
        let length = BulkLength::for_samples(16384).unwrap();
        assert_eq!(length.bytes(), 65536);
        assert_eq!(
            Frame::CaptureRequest(length).encode(),
            [0x5D, 0x01, 0x00, 0x00, 0, 0, 0, 0, 0, 0]
        );
        assert_eq!(
            Frame::WaveformHeader(BulkLength::new(0x123456).unwrap()).encode(),
            [0x5C, 0x12, 0x34, 0x56, 0, 0, 0, 0, 0, 0]
        );
    }

    #[test]
    fn test_dpd_lut_layout() {
        let frame = Frame::DpdLutRead {
            length: BulkLength::for_samples(DPD_LUT_DEPTH).unwrap(),
            lut_id: 9,
        };
        assert_eq!(frame.encode(), [0x6D, 0x00, 0x08, 0x00, 9, 0, 0, 0, 0, 0]);
        assert_eq!(Frame::decode(&frame.encode()), Ok(frame));
    }

    #[test]
    fn test_file_select_layout() {
        let frame = Frame::FileSelect {
            index: 1,
            size: 1024,
        };
        assert_eq!(
            frame.encode(),
            [0x5E, 0x01, 0x00, 0x00, 0x04, 0x00, 0, 0, 0, 0]
        );
        assert_eq!(Frame::decode(&frame.encode()), Ok(frame));
    }

    #[test]
    fn test_bulk_length_limits() {
        assert!(BulkLength::new(MAX_BULK_LEN as usize).is_ok());
        assert_eq!(
            BulkLength::new(MAX_BULK_LEN as usize + 1),
            Err(Error::LengthOverflow(0x0100_0000))
        );
        assert!(BulkLength::for_samples(usize::MAX).is_err());
        assert_eq!(BulkLength::for_samples(3).unwrap().samples(), 3);
    }

    #[test]
    fn test_decode_ignores_padding() {
        let raw = [0x5C, 0x00, 0x00, 0x08, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF];
        assert_eq!(
            Frame::decode(&raw),
            Ok(Frame::WaveformHeader(BulkLength::new(8).unwrap()))
        );
    }

    #[test]
    fn test_decode_unknown_opcode() {
        let raw = [0x42, 0, 0, 0, 0, 0, 0, 0, 0, 0];
        assert_eq!(Frame::decode(&raw), Err(Error::UnknownOpcode(0x42)));
    }

    #[test]
    fn test_every_frame_is_ten_bytes() {
        let access = RegisterAccess::new(1, 2, 3);
        let length = BulkLength::new(4).unwrap();
        let frames = [
            Frame::RegisterWrite(access),
            Frame::RegisterRead(access),
            Frame::WaveformHeader(length),
            Frame::CaptureRequest(length),
            Frame::FileSelect { index: 0, size: 4 },
            Frame::DpdWrite(access),
            Frame::DpdRead(access),
            Frame::DpdLutWrite { length, lut_id: 1 },
            Frame::DpdLutRead { length, lut_id: 1 },
        ];
        for frame in frames {
            let raw = frame.encode();
            assert_eq!(raw.len(), FRAME_LEN);
            assert_eq!(raw[0], frame.opcode());
            assert_eq!(Frame::decode(&raw), Ok(frame));
        }
    }
}
