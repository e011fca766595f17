//! TOML configuration file
//!
//! ```toml
//! [link]
//! bridge = "serial:dev=/dev/ttyUSB0:115200"
//!
//! [timing]
//! response_timeout_ms = 1000
//! poll_interval_ms = 10
//! waveform_settle_ms = 1000
//! capture_settle_ms = 1000
//! capture_settle_per_sample_us = 305
//! response_policy = "resync"
//! ```
//!
//! Every field is optional. Command-line flags override file values, which
//! override the built-in defaults.

use crate::cli::LinkArgs;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;
use zedspi_bridge::{ResponsePolicy, Timing};

/// Configuration file structure
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default)]
    pub link: LinkSection,
    #[serde(default)]
    pub timing: TimingSection,
}

/// `[link]` table
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LinkSection {
    pub bridge: Option<String>,
}

/// `[timing]` table
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TimingSection {
    pub response_timeout_ms: Option<u64>,
    pub poll_interval_ms: Option<u64>,
    pub waveform_settle_ms: Option<u64>,
    pub capture_settle_ms: Option<u64>,
    pub capture_settle_per_sample_us: Option<u64>,
    pub response_policy: Option<String>,
}

/// Resolved link settings for one command
#[derive(Debug, Clone)]
pub struct LinkSettings {
    pub bridge: String,
    pub timing: Timing,
}

impl ConfigFile {
    /// Parse a configuration from TOML text
    pub fn parse(text: &str) -> Result<Self, String> {
        toml::from_str(text).map_err(|e| format!("Invalid configuration: {}", e))
    }

    /// Load a configuration file
    pub fn load(path: &Path) -> Result<Self, String> {
        let text = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
        let config = Self::parse(&text).map_err(|e| format!("{}: {}", path.display(), e))?;
        log::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Apply the `[timing]` table on top of `timing`
    pub fn apply(&self, mut timing: Timing) -> Result<Timing, String> {
        let t = &self.timing;
        if let Some(ms) = t.response_timeout_ms {
            timing.response_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = t.poll_interval_ms {
            timing.poll_interval = Duration::from_millis(ms);
        }
        if let Some(ms) = t.waveform_settle_ms {
            timing.waveform_settle = Duration::from_millis(ms);
        }
        if let Some(ms) = t.capture_settle_ms {
            timing.capture_settle_base = Duration::from_millis(ms);
        }
        if let Some(us) = t.capture_settle_per_sample_us {
            timing.capture_settle_per_sample = Duration::from_micros(us);
        }
        if let Some(policy) = &t.response_policy {
            timing.response_policy = policy.parse()?;
        }
        Ok(timing)
    }

    /// Combine file values with command-line overrides
    pub fn resolve(&self, args: &LinkArgs) -> Result<LinkSettings, String> {
        let bridge = args
            .bridge
            .clone()
            .or_else(|| self.link.bridge.clone())
            .ok_or("No bridge given. Use --bridge or set [link] bridge in --config")?;

        let mut timing = self.apply(Timing::default())?;
        if let Some(ms) = args.response_timeout {
            timing.response_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = args.waveform_settle {
            timing.waveform_settle = Duration::from_millis(ms);
        }
        if let Some(ms) = args.capture_settle {
            timing.capture_settle_base = Duration::from_millis(ms);
        }
        if let Some(policy) = &args.policy {
            timing.response_policy = policy.parse::<ResponsePolicy>()?;
        }

        Ok(LinkSettings { bridge, timing })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_keeps_defaults() {
        let config = ConfigFile::parse("").unwrap();
        assert_eq!(config.apply(Timing::default()).unwrap(), Timing::default());
    }

    #[test]
    fn test_apply_timing_table() {
        let config = ConfigFile::parse(
            r#"
            [timing]
            response_timeout_ms = 250
            capture_settle_per_sample_us = 100
            response_policy = "strict"
            "#,
        )
        .unwrap();
        let timing = config.apply(Timing::default()).unwrap();
        assert_eq!(timing.response_timeout, Duration::from_millis(250));
        assert_eq!(timing.capture_settle_per_sample, Duration::from_micros(100));
        assert_eq!(timing.response_policy, ResponsePolicy::Strict);
        assert_eq!(timing.waveform_settle, Duration::from_secs(1));
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(ConfigFile::parse("[timing]\nresponse_timeout = 5\n").is_err());
    }

    #[test]
    fn test_bad_policy_rejected() {
        let config = ConfigFile::parse("[timing]\nresponse_policy = \"maybe\"\n").unwrap();
        assert!(config.apply(Timing::default()).is_err());
    }

    #[test]
    fn test_flags_override_file() {
        let config = ConfigFile::parse(
            "[link]\nbridge = \"dummy\"\n[timing]\nwaveform_settle_ms = 500\n",
        )
        .unwrap();

        let settings = config.resolve(&LinkArgs::default()).unwrap();
        assert_eq!(settings.bridge, "dummy");
        assert_eq!(settings.timing.waveform_settle, Duration::from_millis(500));

        let args = LinkArgs {
            bridge: Some("serial:dev=/dev/ttyUSB1".to_string()),
            waveform_settle: Some(0),
            policy: Some("discard".to_string()),
            ..LinkArgs::default()
        };
        let settings = config.resolve(&args).unwrap();
        assert_eq!(settings.bridge, "serial:dev=/dev/ttyUSB1");
        assert_eq!(settings.timing.waveform_settle, Duration::ZERO);
        assert_eq!(settings.timing.response_policy, ResponsePolicy::Discard);
    }

    #[test]
    fn test_missing_bridge() {
        let config = ConfigFile::default();
        assert!(config.resolve(&LinkArgs::default()).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("zedspi.toml");
        fs::write(&path, "[link]\nbridge = \"dummy\"\n").unwrap();
        let config = ConfigFile::load(&path).unwrap();
        assert_eq!(config.link.bridge.as_deref(), Some("dummy"));
    }
}
