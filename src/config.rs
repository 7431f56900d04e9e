//! Strongly-typed settings for channel access and orchestration timing.
//!
//! Settings are loaded from a TOML file plus environment variables prefixed
//! with `SC_LINAC_` (e.g. `SC_LINAC_CHANNEL__MAX_ATTEMPTS=5`). Every field
//! has a default matching the deployed machine's behavior, so an empty file
//! is a valid configuration. `validate()` catches values that parse but make
//! no operational sense.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::channel::RetryPolicy;
use crate::error::{LinacError, LinacResult};

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub channel: ChannelSettings,
    #[serde(default)]
    pub timing: TimingSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            channel: ChannelSettings::default(),
            timing: TimingSettings::default(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_owned()
}

/// Channel-layer retry policy and connection handling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelSettings {
    /// Attempts before a read or write raises `ChannelInvalid`.
    pub max_attempts: u32,
    /// Fixed delay between attempts.
    #[serde(with = "humantime_serde")]
    pub retry_backoff: Duration,
    /// Whether exhausted acknowledged writes fall back to a one-shot put.
    pub write_fallback: bool,
    /// Provider connection timeout.
    #[serde(with = "humantime_serde")]
    pub connection_timeout: Duration,
}

impl Default for ChannelSettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_backoff: Duration::from_millis(500),
            write_fallback: true,
            connection_timeout: Duration::from_millis(10),
        }
    }
}

impl ChannelSettings {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            backoff: self.retry_backoff,
            write_fallback: self.write_fallback,
        }
    }
}

/// Settle times and polling intervals for the orchestration layer.
///
/// Defaults are the values the machine was commissioned with; tests shrink
/// them to keep suites fast.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingSettings {
    /// Wait after writing the SSA turn-on command before verifying.
    #[serde(with = "humantime_serde")]
    pub ssa_on_settle: Duration,
    /// Wait after writing the SSA turn-off command before verifying.
    #[serde(with = "humantime_serde")]
    pub ssa_off_settle: Duration,
    /// Wait after resetting cavity interlocks.
    #[serde(with = "humantime_serde")]
    pub interlock_settle: Duration,
    /// Wait after starting a calibration script before polling its status.
    #[serde(with = "humantime_serde")]
    pub calibration_start_settle: Duration,
    /// Interval for every status polling loop.
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,
}

impl Default for TimingSettings {
    fn default() -> Self {
        Self {
            ssa_on_settle: Duration::from_secs(7),
            ssa_off_settle: Duration::from_secs(1),
            interlock_settle: Duration::from_secs(2),
            calibration_start_settle: Duration::from_secs(2),
            poll_interval: Duration::from_secs(1),
        }
    }
}

impl TimingSettings {
    /// Timing for tests: no real waiting.
    pub fn immediate() -> Self {
        Self {
            ssa_on_settle: Duration::ZERO,
            ssa_off_settle: Duration::ZERO,
            interlock_settle: Duration::ZERO,
            calibration_start_settle: Duration::ZERO,
            poll_interval: Duration::from_millis(1),
        }
    }
}

impl Settings {
    /// Load from `path` (optional) plus `SC_LINAC_` environment overrides.
    pub fn load(path: Option<&Path>) -> LinacResult<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }
        let settings: Settings = builder
            .add_source(config::Environment::with_prefix("SC_LINAC").separator("__"))
            .build()?
            .try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject values that parse but cannot work operationally.
    pub fn validate(&self) -> LinacResult<()> {
        if self.channel.max_attempts == 0 {
            return Err(LinacError::Configuration(
                "channel.max_attempts must be at least 1".into(),
            ));
        }
        if self.timing.poll_interval.is_zero() {
            return Err(LinacError::Configuration(
                "timing.poll_interval must be non-zero".into(),
            ));
        }
        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
            other => Err(LinacError::Configuration(format!(
                "unknown log level '{other}'"
            ))),
        }
    }
}
