//! Bridge protocol constants
//!
//! Opcodes and device limits of the serial SPI bridge firmware. All
//! multi-byte header fields are big-endian.

/// Length of every command/response frame
pub const FRAME_LEN: usize = 10;

/// Default serial baud rate of the bridge firmware
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

// Command opcodes
/// Transceiver register write (no response)
pub const OP_REG_WRITE: u8 = 0x5A;
/// Transceiver register read; the response echoes this opcode
pub const OP_REG_READ: u8 = 0x5B;
/// Waveform download header, followed by the raw sample payload
pub const OP_WAVEFORM: u8 = 0x5C;
/// Capture request; the device answers with the raw capture payload
pub const OP_CAPTURE: u8 = 0x5D;
/// Play a waveform file stored on the device's SD card
pub const OP_FILE_SELECT: u8 = 0x5E;
/// DPD actuator register write (no response)
pub const OP_DPD_WRITE: u8 = 0x6A;
/// DPD actuator register read; the response echoes this opcode
pub const OP_DPD_READ: u8 = 0x6B;
/// DPD lookup table write header, followed by the raw table payload
pub const OP_DPD_LUT_WRITE: u8 = 0x6C;
/// DPD lookup table read; the device answers with the raw table payload
pub const OP_DPD_LUT_READ: u8 = 0x6D;

/// Bytes per I/Q sample pair on the wire (16-bit I + 16-bit Q)
pub const BYTES_PER_SAMPLE: usize = 4;

/// Largest value of the 24-bit bulk length field
pub const MAX_BULK_LEN: u32 = 0x00FF_FFFF;

/// Capture buffer size of the device, in sample pairs
pub const MAX_CAPTURE_SAMPLES: usize = 16384;

/// Transmit (DAC) buffer size of the device, in sample pairs
///
/// Waveforms up to [`MAX_DOWNLOAD_SAMPLES`] are received but only loaded
/// when they fit this buffer.
pub const DAC_BUFFER_SAMPLES: usize = 16384;

/// Largest waveform the device can receive, in sample pairs
///
/// The firmware reads the payload into a fixed receive buffer of twice the
/// DAC buffer without a bound check; anything longer overruns it.
pub const MAX_DOWNLOAD_SAMPLES: usize = 2 * DAC_BUFFER_SAMPLES;

/// Largest waveform file the device loads from its SD card, in bytes
pub const MAX_STORED_FILE_SIZE: u32 = 4 * 16384;

/// Rows per DPD lookup table
pub const DPD_LUT_DEPTH: usize = 512;

/// Number of DPD lookup tables in the actuator
pub const DPD_LUT_COUNT: u8 = 64;

/// Human readable name of an opcode, for logging
pub fn opcode_name(opcode: u8) -> &'static str {
    match opcode {
        OP_REG_WRITE => "register write",
        OP_REG_READ => "register read",
        OP_WAVEFORM => "waveform download",
        OP_CAPTURE => "capture",
        OP_FILE_SELECT => "file select",
        OP_DPD_WRITE => "DPD register write",
        OP_DPD_READ => "DPD register read",
        OP_DPD_LUT_WRITE => "DPD LUT write",
        OP_DPD_LUT_READ => "DPD LUT read",
        _ => "unknown",
    }
}

/// Returns true if the device answers this opcode with a 10-byte response frame
pub fn has_response_frame(opcode: u8) -> bool {
    matches!(opcode, OP_REG_READ | OP_DPD_READ)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_reads_are_answered() {
        assert!(has_response_frame(OP_REG_READ));
        assert!(has_response_frame(OP_DPD_READ));
        for op in [OP_REG_WRITE, OP_WAVEFORM, OP_CAPTURE, OP_FILE_SELECT, OP_DPD_WRITE] {
            assert!(!has_response_frame(op), "{}", opcode_name(op));
        }
    }

    #[test]
    fn test_receive_buffer_fits_length_field() {
        assert_eq!(MAX_DOWNLOAD_SAMPLES * BYTES_PER_SAMPLE, 131072);
        assert!(MAX_DOWNLOAD_SAMPLES * BYTES_PER_SAMPLE <= MAX_BULK_LEN as usize);
    }
}
