//! Superconducting RF cavity control.
//!
//! A cavity owns its amplifier (shared with a partner cavity on harmonic
//! linearizers), heater, mechanical tuner, and the RF state, calibration, and
//! diagnostic channels scoped to its physical identity. The two calibration
//! sequences measure the loaded Q of the power coupler and the RF probe
//! scale factor; each result is validated and persisted independently.

use std::sync::Arc;
use tokio::time::sleep;
use tracing::{debug, info};

use crate::calibration::{push_and_save_in_range, run_calibration};
use crate::channel::{Channel, ChannelRegistry, ReadMode};
use crate::config::TimingSettings;
use crate::constants::{
    CALIBRATION_DRIVE_LEVEL, CAVITY_FREQUENCY_HZ, CAVITY_LENGTH_M, CAVITY_SCALE_LOWER_LIMIT,
    CAVITY_SCALE_UPPER_LIMIT, HL_CAVITY_FREQUENCY_HZ, HL_CAVITY_LENGTH_M, LOADED_Q_LOWER_LIMIT,
    LOADED_Q_LOWER_LIMIT_HL, LOADED_Q_UPPER_LIMIT, LOADED_Q_UPPER_LIMIT_HL,
    NOMINAL_PULSED_ONTIME, PULSE_STATUS_SETTLED_VALUE,
};
use crate::error::{LinacError, LinacResult};
use crate::naming;

use super::heater::Heater;
use super::ssa::Ssa;
use super::tuner::StepperTuner;
use super::CavityId;

pub struct Cavity {
    id: CavityId,
    /// Active length (m) and operating frequency (Hz) of this cavity variant.
    pub length_m: f64,
    pub frequency_hz: f64,

    /// Shared with the partner cavity on harmonic linearizers.
    pub ssa: Arc<Ssa>,
    pub heater: Heater,
    pub tuner: StepperTuner,

    interlock_reset: Channel,
    drive_level: Channel,

    calibration_start: Channel,
    calibration_status: Channel,

    current_q_loaded: Channel,
    measured_q_loaded: Channel,
    push_q_loaded: Channel,
    save_q_loaded: Channel,

    current_cavity_scale: Channel,
    measured_cavity_scale: Channel,
    push_cavity_scale: Channel,
    save_cavity_scale: Channel,

    amplitude_des: Channel,
    amplitude_act: Channel,

    rf_mode_control: Channel,
    rf_mode: Channel,
    rf_state: Channel,
    rf_control: Channel,

    pulse_go_button: Channel,
    pulse_status: Channel,
    pulse_on_time: Channel,

    reverse_waveform: Channel,
    forward_waveform: Channel,
    cavity_waveform: Channel,

    timing: TimingSettings,
}

impl Cavity {
    pub fn new(registry: &ChannelRegistry, id: CavityId, timing: TimingSettings) -> Self {
        let prefix = id.channel_prefix();
        let (length_m, frequency_hz) = if id.is_harmonic_linearizer {
            (HL_CAVITY_LENGTH_M, HL_CAVITY_FREQUENCY_HZ)
        } else {
            (CAVITY_LENGTH_M, CAVITY_FREQUENCY_HZ)
        };

        Self {
            ssa: Arc::new(Ssa::new(registry, &prefix, timing.clone())),
            heater: Heater::new(registry, &id.cryomodule, id.number),
            tuner: StepperTuner::new(
                registry,
                &prefix,
                id.is_harmonic_linearizer,
                timing.clone(),
            ),

            interlock_reset: registry.channel(format!("{prefix}INTLK_RESET_ALL")),
            drive_level: registry.channel(format!("{prefix}SEL_ASET")),

            calibration_start: registry.channel(format!("{prefix}PROBECALSTRT")),
            calibration_status: registry.channel(format!("{prefix}PROBECALSTS")),

            current_q_loaded: registry.channel(format!("{prefix}QLOADED")),
            measured_q_loaded: registry.channel(format!("{prefix}QLOADED_NEW")),
            push_q_loaded: registry.channel(format!("{prefix}PUSH_QLOADED.PROC")),
            save_q_loaded: registry.channel(format!("{prefix}SAVE_QLOADED.PROC")),

            current_cavity_scale: registry.channel(format!("{prefix}CAV:SCALER_SEL.B")),
            measured_cavity_scale: registry.channel(format!("{prefix}CAV:CAL_SCALEB_NEW")),
            push_cavity_scale: registry.channel(format!("{prefix}PUSH_CAV_SCALE.PROC")),
            save_cavity_scale: registry.channel(format!("{prefix}SAVE_CAV_SCALE.PROC")),

            amplitude_des: registry.channel(format!("{prefix}ADES")),
            amplitude_act: registry.channel(format!("{prefix}AACTMEAN")),

            rf_mode_control: registry.channel(format!("{prefix}RFMODECTRL")),
            rf_mode: registry.channel(format!("{prefix}RFMODE")),
            rf_state: registry.channel(format!("{prefix}RFSTATE")),
            rf_control: registry.channel(format!("{prefix}RFCTRL")),

            pulse_go_button: registry.channel(format!("{prefix}PULSE_DIFF_SUM")),
            pulse_status: registry.channel(format!("{prefix}PULSE_STATUS")),
            pulse_on_time: registry.channel(format!("{prefix}PULSE_ONTIME")),

            reverse_waveform: registry.channel(format!("{prefix}REV:AWF")),
            forward_waveform: registry.channel(format!("{prefix}FWD:AWF")),
            cavity_waveform: registry.channel(format!("{prefix}CAV:AWF")),

            id,
            length_m,
            frequency_hz,
            timing,
        }
    }

    pub fn id(&self) -> &CavityId {
        &self.id
    }

    pub fn number(&self) -> u8 {
        self.id.number
    }

    /// `CTE:CM{cm}:1{cav}`, the temperature-element prefix for this cavity.
    pub fn cte_prefix(&self) -> String {
        naming::cavity_cte_prefix(&self.id.cryomodule, self.id.number)
    }

    pub async fn turn_on(&self) -> LinacResult<()> {
        self.set_power_state(true).await
    }

    pub async fn turn_off(&self) -> LinacResult<()> {
        self.set_power_state(false).await
    }

    /// Drive the cavity RF to the requested state and verify immediately.
    ///
    /// A state the cavity already holds is never re-commanded; a write that
    /// does not verify raises `PowerError` with no further writes.
    pub async fn set_power_state(&self, turn_on: bool) -> LinacResult<()> {
        let desired: i64 = if turn_on { 1 } else { 0 };

        if self.rf_state.get_i64(ReadMode::Fetch).await? != desired {
            info!(desired, control = %self.rf_control.name(), "setting RF state");
            self.rf_control.put(desired).await?;
            if self.rf_state.get_i64(ReadMode::Fetch).await? != desired {
                return Err(LinacError::Power(format!(
                    "cavity RF did not reach state {desired}"
                )));
            }
        }
        Ok(())
    }

    pub async fn is_on(&self) -> LinacResult<bool> {
        Ok(self.rf_state.get_i64(ReadMode::Fetch).await? == 1)
    }

    /// Correct the pulsed-mode duty cycle.
    ///
    /// Waveform-derived quantities (e.g. the RF gradient) assume the nominal
    /// on time; anything else is corrected and latched with the go button.
    pub async fn check_and_set_on_time(&self) -> LinacResult<()> {
        debug!("checking RF pulse on time");
        let on_time = self.pulse_on_time.get_f64(ReadMode::Fetch).await?;
        if on_time != NOMINAL_PULSED_ONTIME {
            info!(on_time, nominal = NOMINAL_PULSED_ONTIME, "correcting pulse on time");
            self.pulse_on_time.put(NOMINAL_PULSED_ONTIME).await?;
            self.push_go_button().await?;
        }
        Ok(())
    }

    /// Latch pending cavity changes; most settings only take effect once the
    /// go button is pressed.
    ///
    /// Blocks until the pulse status reaches the settled value; ending up
    /// strictly past it is an overshoot and raises `PulseError`.
    pub async fn push_go_button(&self) -> LinacResult<()> {
        self.pulse_go_button.put(1i64).await?;

        let mut status = self.pulse_status.get_i64(ReadMode::Fetch).await?;
        while status < PULSE_STATUS_SETTLED_VALUE {
            sleep(self.timing.poll_interval).await;
            status = self.pulse_status.get_i64(ReadMode::Fetch).await?;
        }

        if status > PULSE_STATUS_SETTLED_VALUE {
            return Err(LinacError::Pulse("unable to pulse cavity".into()));
        }
        Ok(())
    }

    /// Calibrate the RF probe so the amplitude readback is accurate, and
    /// measure the loaded Q of the power coupler.
    ///
    /// Each validated quantity is pushed and saved independently; a failure
    /// on the scale factor does not roll back a successful loaded-Q push.
    pub async fn run_calibration(
        &self,
        loaded_q_lower_limit: f64,
        loaded_q_upper_limit: f64,
    ) -> LinacResult<()> {
        self.interlock_reset.put(1i64).await?;
        sleep(self.timing.interlock_settle).await;

        self.drive_level.put(CALIBRATION_DRIVE_LEVEL).await?;

        run_calibration(
            &self.calibration_start,
            &self.calibration_status,
            &self.timing,
            LinacError::CavityQLoadedCalibration,
        )
        .await?;

        push_and_save_in_range(
            &self.measured_q_loaded,
            loaded_q_lower_limit,
            loaded_q_upper_limit,
            &self.push_q_loaded,
            &self.save_q_loaded,
            LinacError::CavityQLoadedCalibration,
        )
        .await?;

        push_and_save_in_range(
            &self.measured_cavity_scale,
            CAVITY_SCALE_LOWER_LIMIT,
            CAVITY_SCALE_UPPER_LIMIT,
            &self.push_cavity_scale,
            &self.save_cavity_scale,
            LinacError::CavityScaleFactorCalibration,
        )
        .await
    }

    /// `run_calibration` with the loaded-Q bounds for this cavity variant.
    pub async fn run_calibration_default(&self) -> LinacResult<()> {
        let (lower, upper) = if self.id.is_harmonic_linearizer {
            (LOADED_Q_LOWER_LIMIT_HL, LOADED_Q_UPPER_LIMIT_HL)
        } else {
            (LOADED_Q_LOWER_LIMIT, LOADED_Q_UPPER_LIMIT)
        };
        self.run_calibration(lower, upper).await
    }

    pub async fn amplitude_desired(&self) -> LinacResult<f64> {
        self.amplitude_des.get_f64(ReadMode::Cached).await
    }

    pub async fn set_amplitude_desired(&self, mv: f64) -> LinacResult<()> {
        self.amplitude_des.put(mv).await
    }

    pub async fn amplitude_actual(&self) -> LinacResult<f64> {
        self.amplitude_act.get_f64(ReadMode::Cached).await
    }

    pub async fn rf_mode(&self) -> LinacResult<i64> {
        self.rf_mode.get_i64(ReadMode::Cached).await
    }

    pub async fn set_rf_mode(&self, mode: i64) -> LinacResult<()> {
        self.rf_mode_control.put(mode).await
    }

    pub async fn loaded_q(&self) -> LinacResult<f64> {
        self.current_q_loaded.get_f64(ReadMode::Cached).await
    }

    pub async fn cavity_scale(&self) -> LinacResult<f64> {
        self.current_cavity_scale.get_f64(ReadMode::Cached).await
    }

    pub async fn forward_waveform(&self) -> LinacResult<Vec<f64>> {
        self.waveform(&self.forward_waveform).await
    }

    pub async fn reverse_waveform(&self) -> LinacResult<Vec<f64>> {
        self.waveform(&self.reverse_waveform).await
    }

    pub async fn cavity_waveform(&self) -> LinacResult<Vec<f64>> {
        self.waveform(&self.cavity_waveform).await
    }

    async fn waveform(&self, channel: &Channel) -> LinacResult<Vec<f64>> {
        let value = channel.get(ReadMode::Fetch).await?;
        value
            .as_array()
            .map(<[f64]>::to_vec)
            .ok_or_else(|| {
                LinacError::channel_invalid(channel.name(), 1, "expected waveform array")
            })
    }
}
