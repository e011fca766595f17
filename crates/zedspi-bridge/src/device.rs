//! Bridge device implementation
//!
//! This module provides the main `Bridge` struct: the transaction engine for
//! register accesses and the bulk transfers (waveform download, capture
//! read, DPD lookup tables) built on top of it.
//!
//! The protocol has no request IDs, so only one transaction may be in flight.
//! `Bridge` takes `&mut self` for every operation; callers sharing a link
//! across threads must wrap the whole `Bridge` in a lock.

use crate::config::{ResponsePolicy, Timing};
use crate::error::{BridgeError, Result};
use crate::transport::Channel;

use std::time::{Duration, Instant};
use zedspi_core::frame::{self, BulkLength, Frame, RegisterAccess};
use zedspi_core::protocol::*;
use zedspi_core::sample::{self, SamplePair};
use zedspi_core::Error as CoreError;

/// Serial SPI bridge
///
/// Owns the byte channel for its whole lifetime.
pub struct Bridge<C: Channel> {
    /// Byte channel to the device
    channel: C,
    /// Deadlines and settle intervals
    timing: Timing,
}

impl<C: Channel> Bridge<C> {
    /// Create a bridge with default timing
    pub fn new(channel: C) -> Self {
        Self::with_timing(channel, Timing::default())
    }

    /// Create a bridge with custom timing
    pub fn with_timing(channel: C, timing: Timing) -> Self {
        Self { channel, timing }
    }

    /// Current timing parameters
    pub fn timing(&self) -> &Timing {
        &self.timing
    }

    /// Borrow the underlying channel
    pub fn channel(&self) -> &C {
        &self.channel
    }

    /// Mutably borrow the underlying channel
    pub fn channel_mut(&mut self) -> &mut C {
        &mut self.channel
    }

    /// Release the underlying channel
    pub fn into_inner(self) -> C {
        self.channel
    }

    // ---- Register access ----

    /// Write a transceiver register
    ///
    /// Fire-and-forget: the device does not acknowledge writes. The opcode
    /// goes out as a separate sync byte ahead of the rest of the frame.
    pub fn write(&mut self, mode: u8, address: u32, data: u32) -> Result<()> {
        let raw = Frame::RegisterWrite(RegisterAccess::new(mode, address, data)).encode();
        log::trace!("bridge: >> {:02X?}", raw);

        self.channel.write(&raw[..1])?;
        self.channel.flush()?;
        self.channel.write(&raw[1..])?;
        self.channel.flush()?;

        log::debug!(
            "bridge: register write mode={} address=0x{:X} data=0x{:X}",
            mode,
            address,
            data
        );
        Ok(())
    }

    /// Read a transceiver register
    ///
    /// Fails with [`BridgeError::Timeout`] if no response arrives before the
    /// response deadline. The device state is unknown after a timeout.
    pub fn read(&mut self, mode: u8, address: u32) -> Result<u32> {
        let response = self.transact(Frame::RegisterRead(RegisterAccess::request(mode, address)))?;
        log::debug!(
            "bridge: register read mode={} address=0x{:X} data=0x{:X}",
            mode,
            response.address,
            response.data
        );
        Ok(response.data)
    }

    /// Write a DPD actuator register (fire-and-forget)
    pub fn dpd_write(&mut self, address: u8, data: u32) -> Result<()> {
        self.send_frame(&Frame::DpdWrite(RegisterAccess::new(
            0,
            u32::from(address),
            data,
        )))?;
        log::debug!("bridge: DPD write address=0x{:02X} data=0x{:X}", address, data);
        Ok(())
    }

    /// Read a DPD actuator register
    pub fn dpd_read(&mut self, address: u8) -> Result<u32> {
        let response =
            self.transact(Frame::DpdRead(RegisterAccess::request(0, u32::from(address))))?;
        log::debug!(
            "bridge: DPD read address=0x{:02X} data=0x{:X}",
            address,
            response.data
        );
        Ok(response.data)
    }

    // ---- Bulk transfers ----

    /// Download a waveform given as separate I and Q sequences
    ///
    /// Both sequences must have the same length; nothing is sent otherwise.
    pub fn download_waveform(&mut self, samples_i: &[i16], samples_q: &[i16]) -> Result<()> {
        let pairs: Vec<SamplePair> = sample::pair_samples(samples_i, samples_q)?.collect();
        self.download_pairs(&pairs)
    }

    /// Download a waveform given as normalized floats in [-1.0, 1.0]
    pub fn download_waveform_normalized(&mut self, samples_i: &[f32], samples_q: &[f32]) -> Result<()> {
        if samples_i.len() != samples_q.len() {
            return Err(BridgeError::InvalidArgument(CoreError::ChannelLengthMismatch {
                i: samples_i.len(),
                q: samples_q.len(),
            }));
        }
        let pairs: Vec<SamplePair> = samples_i
            .iter()
            .zip(samples_q)
            .map(|(&i, &q)| SamplePair::from_normalized(i, q))
            .collect();
        self.download_pairs(&pairs)
    }

    /// Download a waveform
    ///
    /// Sends the header, waits the waveform settle interval for the device to
    /// prepare its receive buffer, then sends the whole payload in one write.
    /// The device does not acknowledge the transfer.
    ///
    /// Waveforms longer than [`MAX_DOWNLOAD_SAMPLES`] would overrun the
    /// device's receive buffer and are rejected before anything is sent.
    pub fn download_pairs(&mut self, pairs: &[SamplePair]) -> Result<()> {
        let length = BulkLength::for_samples(pairs.len())?;
        if pairs.len() > MAX_DOWNLOAD_SAMPLES {
            return Err(BridgeError::InvalidArgument(CoreError::TooManySamples {
                requested: pairs.len(),
                max: MAX_DOWNLOAD_SAMPLES,
            }));
        }
        if pairs.len() > DAC_BUFFER_SAMPLES {
            log::warn!(
                "bridge: waveform of {} samples exceeds the DAC buffer ({}), the device will not load it",
                pairs.len(),
                DAC_BUFFER_SAMPLES
            );
        }

        self.send_frame(&Frame::WaveformHeader(length))?;
        self.settle(self.timing.waveform_settle);

        let payload: Vec<u8> = sample::download_payload(pairs).collect();
        self.channel.write(&payload)?;
        self.channel.flush()?;

        log::info!(
            "bridge: sent waveform of {} samples ({} bytes)",
            pairs.len(),
            payload.len()
        );
        Ok(())
    }

    /// Read a capture of `count` sample pairs
    ///
    /// `count` may not exceed [`MAX_CAPTURE_SAMPLES`]. After the request the
    /// device needs a size-dependent settle interval to fill its buffer;
    /// whatever has arrived by then is drained, and the rest is awaited until
    /// the link stays idle for the response timeout.
    pub fn read_capture(&mut self, count: usize) -> Result<Vec<SamplePair>> {
        if count > MAX_CAPTURE_SAMPLES {
            return Err(BridgeError::InvalidArgument(CoreError::TooManySamples {
                requested: count,
                max: MAX_CAPTURE_SAMPLES,
            }));
        }
        let length = BulkLength::for_samples(count)?;

        self.discard_stale_input()?;
        self.send_frame(&Frame::CaptureRequest(length))?;
        self.settle(self.timing.capture_settle(count));

        let mut payload = Vec::with_capacity(length.bytes());
        self.channel.read_available(&mut payload)?;
        self.receive_payload(&mut payload, length.bytes())?;

        let samples: Vec<SamplePair> = sample::upload_samples(&payload, count)?.collect();
        log::info!(
            "bridge: received capture of {} samples ({} bytes)",
            samples.len(),
            length.bytes()
        );
        Ok(samples)
    }

    /// Play a waveform file stored on the device's SD card
    ///
    /// Fire-and-forget; the device silently ignores files it cannot load.
    pub fn select_stored_waveform(&mut self, index: u8, size: u32) -> Result<()> {
        if size > MAX_STORED_FILE_SIZE {
            log::warn!(
                "bridge: file size {} exceeds the device limit of {} bytes, the device will ignore it",
                size,
                MAX_STORED_FILE_SIZE
            );
        }
        self.send_frame(&Frame::FileSelect { index, size })?;
        log::info!(
            "bridge: selected stored waveform {} ({} bytes)",
            stored_file_name(index),
            size
        );
        Ok(())
    }

    /// Load one DPD lookup table
    ///
    /// `entries` must hold exactly [`DPD_LUT_DEPTH`] pairs and `lut_id` must
    /// be below [`DPD_LUT_COUNT`]; nothing is sent otherwise.
    pub fn dpd_lut_write(&mut self, lut_id: u8, entries: &[SamplePair]) -> Result<()> {
        check_lut_id(lut_id)?;
        if entries.len() != DPD_LUT_DEPTH {
            return Err(BridgeError::InvalidArgument(CoreError::LutDepthMismatch(
                entries.len(),
            )));
        }
        let length = BulkLength::for_samples(DPD_LUT_DEPTH)?;

        self.send_frame(&Frame::DpdLutWrite { length, lut_id })?;
        self.settle(self.timing.waveform_settle);

        let payload: Vec<u8> = sample::download_payload(entries).collect();
        self.channel.write(&payload)?;
        self.channel.flush()?;

        log::info!("bridge: wrote DPD LUT {}", lut_id);
        Ok(())
    }

    /// Read back one DPD lookup table
    pub fn dpd_lut_read(&mut self, lut_id: u8) -> Result<Vec<SamplePair>> {
        check_lut_id(lut_id)?;
        let length = BulkLength::for_samples(DPD_LUT_DEPTH)?;

        self.discard_stale_input()?;
        self.send_frame(&Frame::DpdLutRead { length, lut_id })?;

        let mut payload = Vec::with_capacity(length.bytes());
        self.receive_payload(&mut payload, length.bytes())?;

        let entries: Vec<SamplePair> = sample::upload_samples(&payload, DPD_LUT_DEPTH)?.collect();
        log::info!("bridge: read DPD LUT {}", lut_id);
        Ok(entries)
    }

    // ---- Protocol implementation ----

    /// Encode and send one frame
    fn send_frame(&mut self, frame: &Frame) -> Result<()> {
        let raw = frame.encode();
        log::trace!("bridge: >> {:02X?}", raw);
        self.channel.write(&raw)?;
        self.channel.flush()?;
        Ok(())
    }

    /// Send a request and wait for the register frame echoing its opcode
    fn transact(&mut self, request: Frame) -> Result<RegisterAccess> {
        let opcode = request.opcode();
        debug_assert!(has_response_frame(opcode), "0x{:02X} has no response", opcode);
        self.discard_stale_input()?;
        self.send_frame(&request)?;

        let deadline = Instant::now() + self.timing.response_timeout;
        let mut block = [0u8; FRAME_LEN];
        let mut filled = 0;

        loop {
            let Some(wait) = self.next_wait(deadline) else {
                log::debug!(
                    "bridge: no {} response, {} stray bytes buffered",
                    opcode_name(opcode),
                    filled
                );
                return Err(BridgeError::Timeout { opcode });
            };
            filled += self.channel.read_timeout(&mut block[filled..], wait)?;
            if filled < FRAME_LEN {
                continue;
            }

            log::trace!("bridge: << {:02X?}", block);
            match frame::decode_response(opcode, &block) {
                Ok(response) => return Ok(response),
                Err(_) => filled = self.realign(opcode, &mut block)?,
            }
        }
    }

    /// Apply the response policy to a misaligned block
    ///
    /// Returns how many bytes of `block` to keep as the head of the next one.
    fn realign(&self, opcode: u8, block: &mut [u8; FRAME_LEN]) -> Result<usize> {
        match self.timing.response_policy {
            ResponsePolicy::Strict => Err(BridgeError::ProtocolMismatch {
                expected: opcode,
                found: block[0],
            }),
            ResponsePolicy::Discard => {
                log::warn!(
                    "bridge: discarding {} bytes starting with 0x{:02X}",
                    FRAME_LEN,
                    block[0]
                );
                Ok(0)
            }
            ResponsePolicy::Resync => {
                let start = block[1..]
                    .iter()
                    .position(|&b| b == opcode)
                    .map_or(FRAME_LEN, |p| p + 1);
                log::warn!(
                    "bridge: dropped {} bytes while resynchronizing on 0x{:02X}",
                    start,
                    opcode
                );
                block.copy_within(start.., 0);
                Ok(FRAME_LEN - start)
            }
        }
    }

    /// Read until `payload` holds `expected` bytes
    ///
    /// Fails once no byte arrived for the response timeout.
    fn receive_payload(&mut self, payload: &mut Vec<u8>, expected: usize) -> Result<()> {
        if payload.len() > expected {
            log::warn!(
                "bridge: ignoring {} surplus bytes",
                payload.len() - expected
            );
            return Ok(());
        }

        let mut filled = payload.len();
        payload.resize(expected, 0);
        let mut deadline = Instant::now() + self.timing.response_timeout;

        while filled < expected {
            let Some(wait) = self.next_wait(deadline) else {
                payload.truncate(filled);
                return Err(BridgeError::IncompleteTransfer {
                    expected,
                    received: filled,
                });
            };
            let n = self.channel.read_timeout(&mut payload[filled..], wait)?;
            if n > 0 {
                filled += n;
                deadline = Instant::now() + self.timing.response_timeout;
            }
        }
        Ok(())
    }

    /// Drop bytes left over from an earlier, abandoned transaction
    fn discard_stale_input(&mut self) -> Result<()> {
        let mut stale = Vec::new();
        let n = self.channel.read_available(&mut stale)?;
        if n > 0 {
            log::warn!("bridge: discarded {} stale bytes before request", n);
            log::trace!("bridge: stale {:02X?}", stale);
        }
        Ok(())
    }

    /// Bounded wait for the next channel read, or `None` once `deadline` passed
    fn next_wait(&self, deadline: Instant) -> Option<Duration> {
        let remaining = deadline.checked_duration_since(Instant::now())?;
        if remaining.is_zero() {
            return None;
        }
        Some(remaining.min(self.timing.poll_interval))
    }

    fn settle(&self, interval: Duration) {
        if interval.is_zero() {
            return;
        }
        log::debug!("bridge: waiting {:?} for the device to settle", interval);
        std::thread::sleep(interval);
    }
}

/// Name of the SD card file the device plays for a file index
pub fn stored_file_name(index: u8) -> String {
    format!("TEST{}.BIN", char::from(b'0'.wrapping_add(index)))
}

fn check_lut_id(lut_id: u8) -> Result<()> {
    if lut_id >= DPD_LUT_COUNT {
        return Err(BridgeError::InvalidArgument(CoreError::LutIndexOutOfRange(
            lut_id,
        )));
    }
    Ok(())
}
