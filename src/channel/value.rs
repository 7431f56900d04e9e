//! Value and status types carried across the channel boundary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A scalar or array value held by a remote channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChannelValue {
    Int(i64),
    Float(f64),
    Str(String),
    FloatArray(Vec<f64>),
}

impl ChannelValue {
    /// Numeric view of the value; integer channels coerce to float.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ChannelValue::Int(v) => Some(*v as f64),
            ChannelValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Integer view of the value; floats truncate.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ChannelValue::Int(v) => Some(*v),
            ChannelValue::Float(v) => Some(*v as i64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ChannelValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[f64]> {
        match self {
            ChannelValue::FloatArray(a) => Some(a),
            _ => None,
        }
    }
}

impl From<i64> for ChannelValue {
    fn from(v: i64) -> Self {
        ChannelValue::Int(v)
    }
}

impl From<f64> for ChannelValue {
    fn from(v: f64) -> Self {
        ChannelValue::Float(v)
    }
}

impl From<&str> for ChannelValue {
    fn from(v: &str) -> Self {
        ChannelValue::Str(v.to_owned())
    }
}

impl From<Vec<f64>> for ChannelValue {
    fn from(v: Vec<f64>) -> Self {
        ChannelValue::FloatArray(v)
    }
}

/// Alarm severity attached to asynchronous updates.
///
/// The numeric values match the control network's severity encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlarmSeverity {
    NoAlarm = 0,
    Minor = 1,
    Major = 2,
    Invalid = 3,
}

/// One asynchronous value/severity update delivered by a subscription.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelUpdate {
    pub value: ChannelValue,
    pub severity: AlarmSeverity,
    pub timestamp: DateTime<Utc>,
}

impl ChannelUpdate {
    pub fn new(value: ChannelValue) -> Self {
        Self {
            value,
            severity: AlarmSeverity::NoAlarm,
            timestamp: Utc::now(),
        }
    }

    pub fn with_severity(mut self, severity: AlarmSeverity) -> Self {
        self.severity = severity;
        self
    }
}

/// Result of an acknowledged write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutStatus {
    /// The provider confirmed the write completed.
    Acked,
    /// The provider reported the write did not take effect.
    Failed,
}

impl PutStatus {
    pub fn is_acked(self) -> bool {
        self == PutStatus::Acked
    }
}

/// Liveness of a channel as seen from this process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelState {
    /// No successful exchange with the provider yet.
    #[default]
    Unconnected,
    /// Last exchange succeeded.
    Connected,
    /// Connected, but the last update carried invalid alarm severity.
    Stale,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_coerces_to_f64() {
        assert_eq!(ChannelValue::Int(3).as_f64(), Some(3.0));
        assert_eq!(ChannelValue::Float(2.5).as_i64(), Some(2));
        assert_eq!(ChannelValue::Str("x".into()).as_f64(), None);
    }

    #[test]
    fn update_defaults_to_no_alarm() {
        let update = ChannelUpdate::new(ChannelValue::Float(1.0));
        assert_eq!(update.severity, AlarmSeverity::NoAlarm);
    }
}
