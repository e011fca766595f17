//! Transaction timing and response handling policy
//!
//! The firmware has no flow control: the host has to give the device time to
//! prepare its buffers after a bulk-transfer header. Those settle intervals
//! and the register-read deadline live here so callers can tune them per
//! link, while the defaults keep the device's timing assumptions.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// What to do with a 10-byte block that does not start with the expected opcode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponsePolicy {
    /// Realign on the next occurrence of the expected opcode inside the block
    #[default]
    Resync,
    /// Drop the whole block and keep waiting
    Discard,
    /// Fail the transaction with a protocol mismatch
    Strict,
}

impl ResponsePolicy {
    /// All policies, in the order they are listed in help output
    pub const ALL: [ResponsePolicy; 3] = [Self::Resync, Self::Discard, Self::Strict];

    /// Name used on the command line and in config files
    pub fn name(self) -> &'static str {
        match self {
            Self::Resync => "resync",
            Self::Discard => "discard",
            Self::Strict => "strict",
        }
    }
}

impl fmt::Display for ResponsePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ResponsePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Invalid response policy: {}. Use resync, discard or strict", s))
    }
}

/// Timing parameters of a bridge link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// Deadline for a register read response, and the idle limit while
    /// receiving a bulk payload
    pub response_timeout: Duration,
    /// Longest single wait handed to the channel while polling
    pub poll_interval: Duration,
    /// Wait between a download header and its payload
    pub waveform_settle: Duration,
    /// Fixed part of the wait between a capture request and reading the data
    pub capture_settle_base: Duration,
    /// Additional capture wait per requested sample pair
    pub capture_settle_per_sample: Duration,
    /// Handling of misaligned response frames
    pub response_policy: ResponsePolicy,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            response_timeout: Duration::from_secs(1),
            poll_interval: Duration::from_millis(10),
            waveform_settle: Duration::from_secs(1),
            capture_settle_base: Duration::from_secs(1),
            // 16384 samples settle for about 6 s in total
            capture_settle_per_sample: Duration::from_micros(305),
            response_policy: ResponsePolicy::default(),
        }
    }
}

impl Timing {
    /// Default timing without settle waits, for emulated links
    pub fn without_settle() -> Self {
        Self {
            waveform_settle: Duration::ZERO,
            capture_settle_base: Duration::ZERO,
            capture_settle_per_sample: Duration::ZERO,
            ..Self::default()
        }
    }

    /// Set the response deadline
    pub fn with_response_timeout(mut self, timeout: Duration) -> Self {
        self.response_timeout = timeout;
        self
    }

    /// Set the response policy
    pub fn with_policy(mut self, policy: ResponsePolicy) -> Self {
        self.response_policy = policy;
        self
    }

    /// Settle interval before reading a capture of `samples` pairs
    pub fn capture_settle(&self, samples: usize) -> Duration {
        let samples = u32::try_from(samples).unwrap_or(u32::MAX);
        self.capture_settle_base
            .saturating_add(self.capture_settle_per_sample.saturating_mul(samples))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_capture_settle() {
        let timing = Timing::default();
        assert_eq!(timing.capture_settle(0), Duration::from_secs(1));
        let full = timing.capture_settle(16384);
        assert!(full > Duration::from_millis(5900));
        assert!(full < Duration::from_millis(6100));
    }

    #[test]
    fn test_without_settle() {
        let timing = Timing::without_settle();
        assert_eq!(timing.capture_settle(16384), Duration::ZERO);
        assert_eq!(timing.waveform_settle, Duration::ZERO);
        assert_eq!(timing.response_timeout, Duration::from_secs(1));
    }

    #[test]
    fn test_policy_parse() {
        assert_eq!("resync".parse::<ResponsePolicy>(), Ok(ResponsePolicy::Resync));
        assert_eq!("STRICT".parse::<ResponsePolicy>(), Ok(ResponsePolicy::Strict));
        assert_eq!("discard".parse::<ResponsePolicy>(), Ok(ResponsePolicy::Discard));
        assert!("drop".parse::<ResponsePolicy>().is_err());
        assert_eq!(ResponsePolicy::Discard.to_string(), "discard");
    }
}
