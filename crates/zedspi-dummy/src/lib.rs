//! zedspi-dummy - Emulated bridge firmware for testing
//!
//! This crate provides a byte channel that behaves like the bridge firmware's
//! command parser: it consumes 10-byte frames, keeps transceiver and DPD
//! registers in memory, stores downloaded waveforms and answers captures by
//! looping the current waveform back. It's useful for testing and
//! development without real hardware.

use std::collections::{BTreeMap, VecDeque};
use std::time::Duration;

use zedspi_bridge::{BridgeError, Channel, Result};
use zedspi_core::frame::{Frame, RawFrame};
use zedspi_core::protocol::*;
use zedspi_core::sample::SamplePair;

/// What the emulated firmware does with an incoming bulk payload
#[derive(Debug, Clone, Copy)]
enum PayloadTarget {
    Waveform,
    DpdLut(u8),
}

#[derive(Debug, Clone, Copy)]
enum RxState {
    /// Collecting a 10-byte command frame
    Command,
    /// Collecting the raw payload announced by a header frame
    Payload { expected: usize, target: PayloadTarget },
}

/// Emulated bridge device
pub struct DummyBridge {
    /// Everything the host has written, in order
    sent: Vec<u8>,
    /// Device to host bytes not yet read
    tx: VecDeque<u8>,
    /// Partial frame or payload being received
    rx: Vec<u8>,
    state: RxState,
    /// Transceiver registers (16-bit address, 8-bit value)
    registers: BTreeMap<u16, u8>,
    dpd_registers: BTreeMap<u8, u32>,
    dpd_luts: BTreeMap<u8, Vec<SamplePair>>,
    /// Waveform currently played by the DAC
    waveform: Vec<SamplePair>,
    /// Waveform files on the emulated SD card
    stored_files: BTreeMap<u8, Vec<SamplePair>>,
    /// Bytes to emit ahead of the next response
    garbage: Vec<u8>,
    muted: bool,
}

impl Default for DummyBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl DummyBridge {
    /// Create an emulated device with empty registers and no waveform
    pub fn new() -> Self {
        Self {
            sent: Vec::new(),
            tx: VecDeque::new(),
            rx: Vec::with_capacity(FRAME_LEN),
            state: RxState::Command,
            registers: BTreeMap::new(),
            dpd_registers: BTreeMap::new(),
            dpd_luts: BTreeMap::new(),
            waveform: Vec::new(),
            stored_files: BTreeMap::new(),
            garbage: Vec::new(),
            muted: false,
        }
    }

    /// Bytes written by the host so far
    pub fn sent(&self) -> &[u8] {
        &self.sent
    }

    /// Value of a transceiver register
    pub fn register(&self, address: u16) -> u8 {
        self.registers.get(&address).copied().unwrap_or(0)
    }

    /// Value of a DPD actuator register
    pub fn dpd_register(&self, address: u8) -> u32 {
        self.dpd_registers.get(&address).copied().unwrap_or(0)
    }

    /// Contents of a DPD lookup table, if it was ever written
    pub fn dpd_lut(&self, lut_id: u8) -> Option<&[SamplePair]> {
        self.dpd_luts.get(&lut_id).map(Vec::as_slice)
    }

    /// Waveform currently loaded into the DAC buffer
    pub fn waveform(&self) -> &[SamplePair] {
        &self.waveform
    }

    /// Put a waveform file on the emulated SD card
    pub fn store_file(&mut self, index: u8, samples: Vec<SamplePair>) {
        self.stored_files.insert(index, samples);
    }

    /// Prefix the next response with stray bytes
    pub fn inject_garbage(&mut self, bytes: &[u8]) {
        self.garbage.extend_from_slice(bytes);
    }

    /// Stop answering requests (simulates a hung device)
    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    fn respond(&mut self, bytes: &[u8]) {
        if self.muted {
            log::debug!("dummy: muted, dropping {} byte response", bytes.len());
            return;
        }
        self.tx.extend(self.garbage.drain(..));
        self.tx.extend(bytes);
    }

    fn receive(&mut self, byte: u8) {
        self.rx.push(byte);
        match self.state {
            RxState::Command => {
                if self.rx.len() == FRAME_LEN {
                    let mut raw: RawFrame = [0; FRAME_LEN];
                    raw.copy_from_slice(&self.rx);
                    self.rx.clear();
                    self.handle_command(&raw);
                }
            }
            RxState::Payload { expected, target } => {
                if self.rx.len() == expected {
                    let payload = std::mem::take(&mut self.rx);
                    self.state = RxState::Command;
                    self.handle_payload(target, &payload);
                }
            }
        }
    }

    fn expect_payload(&mut self, expected: usize, target: PayloadTarget) {
        if expected > 0 {
            self.state = RxState::Payload { expected, target };
        } else {
            self.handle_payload(target, &[]);
        }
    }

    fn handle_command(&mut self, raw: &RawFrame) {
        let frame = match Frame::decode(raw) {
            Ok(frame) => frame,
            Err(e) => {
                log::debug!("dummy: invalid command: {}", e);
                return;
            }
        };
        log::trace!("dummy: {:?}", frame);

        match frame {
            Frame::RegisterWrite(access) => {
                self.registers
                    .insert(access.address as u16, access.data as u8);
            }
            Frame::RegisterRead(mut access) => {
                access.data = u32::from(self.register(access.address as u16));
                self.respond(&Frame::RegisterRead(access).encode());
            }
            Frame::WaveformHeader(length) => {
                self.expect_payload(length.bytes(), PayloadTarget::Waveform)
            }
            Frame::CaptureRequest(length) => {
                let payload = self.capture(length.bytes());
                self.respond(&payload);
            }
            Frame::FileSelect { index, size } => {
                if size > MAX_STORED_FILE_SIZE {
                    return;
                }
                if let Some(file) = self.stored_files.get(&index) {
                    let count = (size as usize / BYTES_PER_SAMPLE).min(file.len());
                    self.waveform = file[..count].to_vec();
                }
            }
            Frame::DpdWrite(access) => {
                self.dpd_registers.insert(access.address as u8, access.data);
            }
            Frame::DpdRead(mut access) => {
                access.data = self.dpd_register(access.address as u8);
                self.respond(&Frame::DpdRead(access).encode());
            }
            Frame::DpdLutWrite { length, lut_id } => {
                self.expect_payload(length.bytes(), PayloadTarget::DpdLut(lut_id))
            }
            Frame::DpdLutRead { length, lut_id } => {
                if lut_id < DPD_LUT_COUNT && length.samples() == DPD_LUT_DEPTH {
                    let lut = self
                        .dpd_luts
                        .get(&lut_id)
                        .cloned()
                        .unwrap_or_else(|| vec![SamplePair::default(); DPD_LUT_DEPTH]);
                    let payload: Vec<u8> = lut.iter().flat_map(|s| upload_bytes(*s)).collect();
                    self.respond(&payload);
                }
            }
        }
    }

    fn handle_payload(&mut self, target: PayloadTarget, payload: &[u8]) {
        let samples = download_samples(payload);
        match target {
            PayloadTarget::Waveform => {
                if samples.len() <= DAC_BUFFER_SAMPLES {
                    self.waveform = samples;
                }
            }
            PayloadTarget::DpdLut(lut_id) => {
                if lut_id < DPD_LUT_COUNT && samples.len() == DPD_LUT_DEPTH {
                    self.dpd_luts.insert(lut_id, samples);
                }
            }
        }
    }

    /// Loop the current waveform back as `bytes` of capture data
    fn capture(&self, bytes: usize) -> Vec<u8> {
        let count = bytes / BYTES_PER_SAMPLE;
        let mut payload: Vec<u8> = if self.waveform.is_empty() {
            vec![0; count * BYTES_PER_SAMPLE]
        } else {
            self.waveform
                .iter()
                .cycle()
                .take(count)
                .flat_map(|s| upload_bytes(*s))
                .collect()
        };
        payload.resize(bytes, 0);
        payload
    }
}

/// Parse a host to device payload (big-endian I, big-endian Q)
fn download_samples(payload: &[u8]) -> Vec<SamplePair> {
    payload
        .chunks_exact(BYTES_PER_SAMPLE)
        .map(|c| {
            SamplePair::new(
                i16::from_be_bytes([c[0], c[1]]),
                i16::from_be_bytes([c[2], c[3]]),
            )
        })
        .collect()
}

/// Serialize a sample the way the device memory holds it (little-endian)
fn upload_bytes(sample: SamplePair) -> [u8; BYTES_PER_SAMPLE] {
    let [i0, i1] = sample.i.to_le_bytes();
    let [q0, q1] = sample.q.to_le_bytes();
    [i0, i1, q0, q1]
}

impl Channel for DummyBridge {
    fn write(&mut self, data: &[u8]) -> Result<()> {
        self.sent.extend_from_slice(data);
        for &byte in data {
            self.receive(byte);
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn bytes_available(&mut self) -> Result<usize> {
        Ok(self.tx.len())
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        if buf.len() > self.tx.len() {
            return Err(BridgeError::IoError(format!(
                "Read of {} bytes timed out with {} pending",
                buf.len(),
                self.tx.len()
            )));
        }
        let n = buf.len();
        for (dst, src) in buf.iter_mut().zip(self.tx.drain(..n)) {
            *dst = src;
        }
        Ok(())
    }

    fn read_timeout(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize> {
        if self.tx.is_empty() {
            // Nothing will arrive; behave like a blocking port
            std::thread::sleep(timeout);
            return Ok(0);
        }
        let n = buf.len().min(self.tx.len());
        self.read_exact(&mut buf[..n])?;
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zedspi_core::frame::RegisterAccess;
    use zedspi_core::sample;

    #[test]
    fn test_register_write_then_read() {
        let mut dummy = DummyBridge::new();
        dummy
            .write(&Frame::RegisterWrite(RegisterAccess::new(0, 0x000A, 0x12)).encode())
            .unwrap();
        assert_eq!(dummy.register(0x000A), 0x12);

        dummy
            .write(&Frame::RegisterRead(RegisterAccess::request(0, 0x000A)).encode())
            .unwrap();
        let mut response = [0u8; FRAME_LEN];
        dummy.read_exact(&mut response).unwrap();
        assert_eq!(response, [0x5B, 0, 0, 0, 0, 0x0A, 0, 0, 0, 0x12]);
    }

    #[test]
    fn test_response_read_in_pieces() {
        let mut dummy = DummyBridge::new();
        dummy
            .write(&Frame::RegisterWrite(RegisterAccess::new(0, 0x0003, 0x7E)).encode())
            .unwrap();
        dummy
            .write(&Frame::RegisterRead(RegisterAccess::request(0, 0x0003)).encode())
            .unwrap();

        let mut head = [0u8; 4];
        dummy.read_exact(&mut head).unwrap();
        assert_eq!(head, [0x5B, 0, 0, 0]);
        assert_eq!(dummy.bytes_available().unwrap(), FRAME_LEN - 4);

        let mut tail = [0u8; FRAME_LEN];
        let n = dummy.read_timeout(&mut tail, Duration::from_millis(1)).unwrap();
        assert_eq!(&tail[..n], [0, 0x03, 0, 0, 0, 0x7E]);
        assert!(dummy.read_exact(&mut head).is_err());
    }

    #[test]
    fn test_frame_split_across_writes() {
        let mut dummy = DummyBridge::new();
        let raw = Frame::DpdWrite(RegisterAccess::new(0, 0x0C, 0xDEAD_BEEF)).encode();
        dummy.write(&raw[..1]).unwrap();
        dummy.write(&raw[1..4]).unwrap();
        assert_eq!(dummy.dpd_register(0x0C), 0);
        dummy.write(&raw[4..]).unwrap();
        assert_eq!(dummy.dpd_register(0x0C), 0xDEAD_BEEF);
    }

    #[test]
    fn test_capture_loops_waveform() {
        let mut dummy = DummyBridge::new();
        let pairs = [SamplePair::new(0x0102, 0x0304), SamplePair::new(-1, 1)];
        let length = zedspi_core::BulkLength::for_samples(pairs.len()).unwrap();
        dummy.write(&Frame::WaveformHeader(length).encode()).unwrap();
        let payload: Vec<u8> = sample::download_payload(&pairs).collect();
        dummy.write(&payload).unwrap();
        assert_eq!(dummy.waveform(), pairs);

        let length = zedspi_core::BulkLength::for_samples(3).unwrap();
        dummy.write(&Frame::CaptureRequest(length).encode()).unwrap();
        let mut out = Vec::new();
        dummy.read_available(&mut out).unwrap();
        assert_eq!(
            out,
            [0x02, 0x01, 0x04, 0x03, 0xFF, 0xFF, 0x01, 0x00, 0x02, 0x01, 0x04, 0x03]
        );
    }

    #[test]
    fn test_muted_device_stays_silent() {
        let mut dummy = DummyBridge::new();
        dummy.set_muted(true);
        dummy
            .write(&Frame::RegisterRead(RegisterAccess::request(0, 1)).encode())
            .unwrap();
        assert_eq!(dummy.bytes_available().unwrap(), 0);
        let mut buf = [0u8; 4];
        assert_eq!(
            dummy.read_timeout(&mut buf, Duration::from_millis(1)).unwrap(),
            0
        );
    }

    #[test]
    fn test_oversized_file_is_ignored() {
        let mut dummy = DummyBridge::new();
        dummy.store_file(2, vec![SamplePair::new(5, 6); 4]);
        dummy
            .write(
                &Frame::FileSelect {
                    index: 2,
                    size: MAX_STORED_FILE_SIZE + 4,
                }
                .encode(),
            )
            .unwrap();
        assert!(dummy.waveform().is_empty());

        dummy
            .write(&Frame::FileSelect { index: 2, size: 8 }.encode())
            .unwrap();
        assert_eq!(dummy.waveform(), [SamplePair::new(5, 6); 2]);
    }
}
