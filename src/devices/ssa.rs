//! Solid-state amplifier (SSA) control.
//!
//! One SSA drives one cavity (harmonic-linearizer cryomodules share one SSA
//! across a cavity pair, so the topology layer hands out `Arc<Ssa>`). Power
//! state is a write-settle-verify machine against the status message channel;
//! calibration sweeps the unit through its range and persists the measured
//! drive/output slope if it falls inside the accepted band.

use tokio::time::sleep;
use tracing::{info, warn};

use crate::calibration::{push_and_save_in_range, run_calibration};
use crate::channel::{Channel, ChannelRegistry, ReadMode};
use crate::config::TimingSettings;
use crate::constants::{SSA_SLOPE_LOWER_LIMIT, SSA_SLOPE_UPPER_LIMIT, SSA_STATUS_ON_VALUE};
use crate::error::{LinacError, LinacResult};

pub struct Ssa {
    status: Channel,
    turn_on: Channel,
    turn_off: Channel,
    calibration_start: Channel,
    calibration_status: Channel,
    current_slope: Channel,
    measured_slope: Channel,
    // Push/save process channels live under the owning cavity's prefix
    push_slope: Channel,
    save_slope: Channel,
    timing: TimingSettings,
}

impl Ssa {
    pub fn new(registry: &ChannelRegistry, cavity_prefix: &str, timing: TimingSettings) -> Self {
        let prefix = format!("{cavity_prefix}SSA:");
        Self {
            status: registry.channel(format!("{prefix}StatusMsg")),
            turn_on: registry.channel(format!("{prefix}PowerOn")),
            turn_off: registry.channel(format!("{prefix}PowerOff")),
            calibration_start: registry.channel(format!("{prefix}CALSTRT")),
            calibration_status: registry.channel(format!("{prefix}CALSTS")),
            current_slope: registry.channel(format!("{prefix}SLOPE")),
            measured_slope: registry.channel(format!("{prefix}SLOPE_NEW")),
            push_slope: registry.channel(format!("{cavity_prefix}PUSH_SSA_SLOPE.PROC")),
            save_slope: registry.channel(format!("{cavity_prefix}SAVE_SSA_SLOPE.PROC")),
            timing,
        }
    }

    pub async fn is_on(&self) -> LinacResult<bool> {
        Ok(self.status.get_i64(ReadMode::Fetch).await? == SSA_STATUS_ON_VALUE)
    }

    pub async fn turn_on(&self) -> LinacResult<()> {
        self.set_power_state(true).await
    }

    pub async fn turn_off(&self) -> LinacResult<()> {
        self.set_power_state(false).await
    }

    /// Drive the SSA to the requested power state.
    ///
    /// A state the SSA already holds is never re-commanded. Otherwise the
    /// command channel is written once, the settle time elapses, and the
    /// status is re-verified; failure to verify raises `PowerError`.
    pub async fn set_power_state(&self, turn_on: bool) -> LinacResult<()> {
        if turn_on {
            if !self.is_on().await? {
                info!(command = %self.turn_on.name(), "turning SSA on");
                self.turn_on.put(1i64).await?;
                sleep(self.timing.ssa_on_settle).await;
                if !self.is_on().await? {
                    return Err(LinacError::Power("unable to turn on SSA".into()));
                }
            }
        } else if self.is_on().await? {
            info!(command = %self.turn_off.name(), "turning SSA off");
            self.turn_off.put(1i64).await?;
            sleep(self.timing.ssa_off_settle).await;
            if self.is_on().await? {
                return Err(LinacError::Power("unable to turn off SSA".into()));
            }
        }
        Ok(())
    }

    /// Run the SSA through its range and persist the slope describing the
    /// drive-signal/output-power relationship.
    ///
    /// An out-of-range slope or a crashed sweep raises `SsaCalibration` and
    /// leaves the persisted operating slope untouched.
    pub async fn run_calibration(&self) -> LinacResult<()> {
        self.set_power_state(true).await?;

        run_calibration(
            &self.calibration_start,
            &self.calibration_status,
            &self.timing,
            LinacError::SsaCalibration,
        )
        .await?;

        push_and_save_in_range(
            &self.measured_slope,
            SSA_SLOPE_LOWER_LIMIT,
            SSA_SLOPE_UPPER_LIMIT,
            &self.push_slope,
            &self.save_slope,
            LinacError::SsaCalibration,
        )
        .await
        .inspect_err(|err| warn!(%err, "SSA slope rejected"))
    }

    /// Operating slope currently in effect.
    pub async fn current_slope(&self) -> LinacResult<f64> {
        self.current_slope.get_f64(ReadMode::Cached).await
    }

    /// Slope measured by the last calibration sweep.
    pub async fn measured_slope(&self) -> LinacResult<f64> {
        self.measured_slope.get_f64(ReadMode::Cached).await
    }
}
