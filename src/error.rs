//! Custom error types for the library.
//!
//! This module defines the primary error type, `LinacError`, for the whole
//! crate. Using the `thiserror` crate, it provides one centralized taxonomy
//! for everything that can go wrong while driving the machine: exhausted
//! channel retries, failed power transitions, calibration faults, motion
//! faults, and structural misconfiguration.
//!
//! The propagation policy is deliberately simple: transient remote faults are
//! retried (and logged) inside the channel layer and never surface unless
//! retries are exhausted; every higher-level fault is raised to the caller
//! rather than retried automatically. The caller decides whether to retry a
//! whole operation.

use thiserror::Error;

/// Convenience alias for results using the library error type.
pub type LinacResult<T> = std::result::Result<T, LinacError>;

#[derive(Error, Debug)]
pub enum LinacError {
    /// A channel read or write exhausted its retry budget.
    #[error("channel {name} invalid after {attempts} attempts: {reason}")]
    ChannelInvalid {
        name: String,
        attempts: u32,
        reason: String,
    },

    /// An amplifier or cavity failed to reach a verified power state.
    #[error("power transition failed: {0}")]
    Power(String),

    /// SSA calibration sequence fault or out-of-range slope.
    #[error("SSA calibration failed: {0}")]
    SsaCalibration(String),

    /// Cavity loaded-Q measurement fault or out-of-range result.
    #[error("cavity loaded-Q calibration failed: {0}")]
    CavityQLoadedCalibration(String),

    /// Cavity scale factor fault or out-of-range result.
    #[error("cavity scale factor calibration failed: {0}")]
    CavityScaleFactorCalibration(String),

    /// The tuner motor did not reach its verified done state.
    #[error("stepper motor fault: {0}")]
    Motor(String),

    /// Pulse status overshot the settled threshold.
    #[error("pulse fault: {0}")]
    Pulse(String),

    /// Structural misconfiguration found while building the device tree.
    #[error("topology error: {0}")]
    Topology(String),

    /// Semantic errors in the configuration, caught during validation.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Wraps errors from the `config` crate (file parsing or format issues).
    #[error("configuration load error: {0}")]
    ConfigLoad(#[from] config::ConfigError),
}

impl LinacError {
    /// A `ChannelInvalid` for `name` after `attempts` tries.
    pub fn channel_invalid(
        name: impl Into<String>,
        attempts: u32,
        reason: impl Into<String>,
    ) -> Self {
        LinacError::ChannelInvalid {
            name: name.into(),
            attempts,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_invalid_display_names_channel_and_attempts() {
        let err = LinacError::channel_invalid("ACCL:L1B:0210:ADES", 3, "no acknowledgment");
        let msg = err.to_string();
        assert!(msg.contains("ACCL:L1B:0210:ADES"));
        assert!(msg.contains("3 attempts"));
    }

    #[test]
    fn calibration_variants_are_distinct() {
        let q = LinacError::CavityQLoadedCalibration("out of range".into());
        let s = LinacError::CavityScaleFactorCalibration("out of range".into());
        assert!(q.to_string().contains("loaded-Q"));
        assert!(s.to_string().contains("scale factor"));
    }
}
