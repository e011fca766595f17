//! I/Q samples and bulk payload packing
//!
//! The two bulk directions use different byte orders, matching the two
//! device paths they feed:
//!
//! - host to device (waveform, DPD LUT write): big-endian I, then big-endian Q
//! - device to host (capture, DPD LUT read): little-endian I, then little-endian Q
//!
//! Both conventions are part of the wire format and must not be unified.

use crate::error::{Error, Result};
use crate::protocol::BYTES_PER_SAMPLE;

/// One in-phase / quadrature sample pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct SamplePair {
    /// In-phase component
    pub i: i16,
    /// Quadrature component
    pub q: i16,
}

impl SamplePair {
    /// Create a sample pair
    pub const fn new(i: i16, q: i16) -> Self {
        Self { i, q }
    }

    /// Quantize a normalized pair, see [`quantize`]
    pub fn from_normalized(i: f32, q: f32) -> Self {
        Self::new(quantize(i), quantize(q))
    }

    /// Download byte order: big-endian I followed by big-endian Q
    pub fn to_download_bytes(self) -> [u8; BYTES_PER_SAMPLE] {
        let [i0, i1] = self.i.to_be_bytes();
        let [q0, q1] = self.q.to_be_bytes();
        [i0, i1, q0, q1]
    }

    /// Upload byte order: little-endian I followed by little-endian Q
    pub fn from_upload_bytes(b: [u8; BYTES_PER_SAMPLE]) -> Self {
        Self::new(i16::from_le_bytes([b[0], b[1]]), i16::from_le_bytes([b[2], b[3]]))
    }

    /// Raw 16-bit words, as printed by the capture tooling
    pub fn to_words(self) -> (u16, u16) {
        (self.i as u16, self.q as u16)
    }
}

/// Map a normalized value in [-1.0, 1.0] to a signed 16-bit code
///
/// +1.0 saturates to 0x7FFF and -1.0 maps to 0x8000. Positive values are
/// scaled by 0x7FFF and truncated, negative values are scaled by 0x8000 and
/// rounded down. Out of range inputs are clamped, NaN maps to zero.
pub fn quantize(value: f32) -> i16 {
    if value.is_nan() {
        return 0;
    }
    let value = value.clamp(-1.0, 1.0);
    if value >= 0.0 {
        (value * 32767.0) as i16
    } else {
        let scaled = value * 32768.0;
        let truncated = scaled as i32;
        let floored = if (truncated as f32) > scaled {
            truncated - 1
        } else {
            truncated
        };
        floored as i16
    }
}

/// Zip separate I and Q sequences into sample pairs
///
/// Fails before producing anything if the sequences differ in length.
pub fn pair_samples<'a>(
    i: &'a [i16],
    q: &'a [i16],
) -> Result<impl ExactSizeIterator<Item = SamplePair> + 'a> {
    if i.len() != q.len() {
        return Err(Error::ChannelLengthMismatch {
            i: i.len(),
            q: q.len(),
        });
    }
    Ok(i.iter().zip(q).map(|(&i, &q)| SamplePair::new(i, q)))
}

/// Serialize sample pairs into a download payload (big-endian)
pub fn download_payload(pairs: &[SamplePair]) -> impl Iterator<Item = u8> + '_ {
    pairs.iter().flat_map(|pair| pair.to_download_bytes())
}

/// De-interleave `count` sample pairs from an upload payload (little-endian)
///
/// Bytes beyond `count` pairs are ignored.
pub fn upload_samples(
    payload: &[u8],
    count: usize,
) -> Result<impl ExactSizeIterator<Item = SamplePair> + '_> {
    let needed = count.saturating_mul(BYTES_PER_SAMPLE);
    if payload.len() < needed {
        return Err(Error::ShortPayload {
            expected: needed,
            found: payload.len(),
        });
    }
    Ok(payload[..needed]
        .chunks_exact(BYTES_PER_SAMPLE)
        .map(|c| SamplePair::from_upload_bytes([c[0], c[1], c[2], c[3]])))
}
