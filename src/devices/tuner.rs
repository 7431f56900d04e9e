//! Stepper-driven mechanical tuner.
//!
//! Large moves are decomposed into segments no bigger than the configured
//! maximum step count; segment direction is encoded by sign. Limit channels
//! are written once before the first segment only, and defaults are restored
//! after the last. Harmonic-linearizer tuners physically move opposite to the
//! logical sign, so their command direction is inverted.
//!
//! A temperature interlock rides on the cumulative-step channel: every update
//! checks the stepper temperature and writes the abort command the moment it
//! reaches the limit. The interlock runs on the subscription delivery context,
//! concurrent with any in-progress move, and takes precedence over it: an
//! aborted segment surfaces as a motor fault, never a silent retry.

use std::sync::atomic::{AtomicBool, Ordering};
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::channel::{Channel, ChannelRegistry, ReadMode};
use crate::config::TimingSettings;
use crate::constants::{
    DEFAULT_STEPPER_MAX_STEPS, DEFAULT_STEPPER_SPEED, MAX_STEPPER_SPEED, STEPPER_TEMP_LIMIT,
};
use crate::error::{LinacError, LinacResult};

pub struct StepperTuner {
    move_pos: Channel,
    move_neg: Channel,
    abort: Channel,
    step_des: Channel,
    max_steps: Channel,
    speed: Channel,
    steps_total_abs: Channel,
    steps_total_signed: Channel,
    reset_abs: Channel,
    reset_signed: Channel,
    steps_cold_landing: Channel,
    push_cold: Channel,
    push_park: Channel,
    motor_moving: Channel,
    motor_done: Channel,
    /// Stepper temperature lives under the cavity prefix, not the STEP prefix.
    temperature: Channel,
    /// Harmonic-linearizer motors run opposite to the logical direction.
    invert_direction: bool,
    interlock_armed: AtomicBool,
    timing: TimingSettings,
}

impl StepperTuner {
    pub fn new(
        registry: &ChannelRegistry,
        cavity_prefix: &str,
        invert_direction: bool,
        timing: TimingSettings,
    ) -> Self {
        let prefix = format!("{cavity_prefix}STEP:");
        Self {
            move_pos: registry.channel(format!("{prefix}MOV_REQ_POS")),
            move_neg: registry.channel(format!("{prefix}MOV_REQ_NEG")),
            abort: registry.channel(format!("{prefix}ABORT_REQ")),
            step_des: registry.channel(format!("{prefix}NSTEPS")),
            max_steps: registry.channel(format!("{prefix}NSTEPS.DRVH")),
            speed: registry.channel(format!("{prefix}VELO")),
            steps_total_abs: registry.channel(format!("{prefix}REG_TOTABS")),
            steps_total_signed: registry.channel(format!("{prefix}REG_TOTSGN")),
            reset_abs: registry.channel(format!("{prefix}TOTABS_RESET")),
            reset_signed: registry.channel(format!("{prefix}TOTSGN_RESET")),
            steps_cold_landing: registry.channel(format!("{prefix}NSTEPS_COLD")),
            push_cold: registry.channel(format!("{prefix}PUSH_NSTEPS_COLD.PROC")),
            push_park: registry.channel(format!("{prefix}PUSH_NSTEPS_PARK.PROC")),
            motor_moving: registry.channel(format!("{prefix}STAT_MOV")),
            motor_done: registry.channel(format!("{prefix}STAT_DONE")),
            temperature: registry.channel(format!("{cavity_prefix}STEPTEMP")),
            invert_direction,
            interlock_armed: AtomicBool::new(false),
            timing,
        }
    }

    /// Register the temperature interlock on the cumulative-step channel.
    ///
    /// Idempotent; armed automatically before the first move. The callback
    /// runs on the delivery context and must not block it, so the
    /// temperature check and abort write are spawned.
    pub async fn arm_temperature_interlock(&self) -> LinacResult<()> {
        if self.interlock_armed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        let temperature = self.temperature.clone();
        let abort = self.abort.clone();
        self.steps_total_abs
            .on_change(move |_update| {
                let temperature = temperature.clone();
                let abort = abort.clone();
                tokio::spawn(async move {
                    match temperature.get_f64(ReadMode::Cached).await {
                        Ok(temp) if temp >= STEPPER_TEMP_LIMIT => {
                            warn!(temp, "stepper temperature at limit, aborting move");
                            if let Err(err) = abort.put(1i64).await {
                                warn!(%err, "failed to write stepper abort");
                            }
                        }
                        Ok(_) => {}
                        Err(err) => warn!(%err, "stepper temperature unreadable"),
                    }
                });
            })
            .await
    }

    /// Write the default motion limits back.
    pub async fn restore_defaults(&self) -> LinacResult<()> {
        self.max_steps.put(DEFAULT_STEPPER_MAX_STEPS).await?;
        self.speed.put(DEFAULT_STEPPER_SPEED).await
    }

    /// Move `num_steps` (positive lengthens the cavity), segmented so no
    /// single command exceeds `max_steps`.
    ///
    /// When `change_limits` is set, the step limit and (ceiling-capped) speed
    /// are written once before the first segment; they are never re-applied
    /// mid-move. Defaults are restored after the final segment.
    pub async fn move_steps(
        &self,
        num_steps: i64,
        max_steps: i64,
        speed: i64,
        change_limits: bool,
    ) -> LinacResult<()> {
        if max_steps <= 0 {
            return Err(LinacError::Motor(format!(
                "segment limit must be positive, got {max_steps}"
            )));
        }

        self.arm_temperature_interlock().await?;

        if change_limits {
            // Guard against someone handing us a negative limit.
            self.max_steps.put(max_steps.abs()).await?;
            self.speed.put(speed.min(MAX_STEPPER_SPEED)).await?;
        }

        info!(num_steps, max_steps, "starting tuner move");

        let mut remaining = num_steps;
        while remaining.abs() > max_steps {
            let segment = remaining.signum() * max_steps;
            self.step_des.put(segment).await?;
            self.issue_move_command(segment).await?;
            remaining -= segment;
        }

        if remaining != 0 {
            self.step_des.put(remaining).await?;
            self.issue_move_command(remaining).await?;
        }

        self.restore_defaults().await
    }

    /// Issue one motion segment and block until the motor stops.
    ///
    /// The busy poll is a fixed-interval blocking wait; the abort interlock
    /// can fire mid-segment, in which case the done check fails and the move
    /// surfaces `MotorError`.
    async fn issue_move_command(&self, num_steps: i64) -> LinacResult<()> {
        let physical_steps = if self.invert_direction {
            -num_steps
        } else {
            num_steps
        };

        if physical_steps > 0 {
            self.move_pos.put(1i64).await?;
        } else {
            self.move_neg.put(1i64).await?;
        }
        debug!(num_steps, physical_steps, "motion segment issued");

        while self.motor_moving.get_i64(ReadMode::Fetch).await? == 1 {
            sleep(self.timing.poll_interval).await;
        }

        if self.motor_done.get_i64(ReadMode::Fetch).await? != 1 {
            return Err(LinacError::Motor("motor not in expected state".into()));
        }
        Ok(())
    }

    /// Abort any in-progress motion.
    pub async fn request_abort(&self) -> LinacResult<()> {
        self.abort.put(1i64).await
    }

    /// Cumulative absolute steps since the last reset.
    pub async fn steps_total(&self) -> LinacResult<i64> {
        self.steps_total_abs.get_i64(ReadMode::Cached).await
    }

    /// Cumulative signed steps since the last reset.
    pub async fn steps_total_signed(&self) -> LinacResult<i64> {
        self.steps_total_signed.get_i64(ReadMode::Cached).await
    }

    pub async fn reset_step_totals(&self) -> LinacResult<()> {
        self.reset_abs.put(1i64).await?;
        self.reset_signed.put(1i64).await
    }

    pub async fn steps_to_cold_landing(&self) -> LinacResult<i64> {
        self.steps_cold_landing.get_i64(ReadMode::Cached).await
    }

    /// Record the current signed total as the cold-landing step count.
    pub async fn push_cold_landing(&self) -> LinacResult<()> {
        self.push_cold.put(1i64).await
    }

    /// Record the current signed total as the park step count.
    pub async fn push_park(&self) -> LinacResult<()> {
        self.push_park.put(1i64).await
    }
}
