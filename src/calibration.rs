//! Generic calibration-sequence plumbing shared by the SSA and cavity
//! calibrations: start a hardware-driven sweep and poll its status channel to
//! completion, then validate and persist the measured result.
//!
//! Both helpers are parameterized over the caller's failure constructor so a
//! fault surfaces as the right typed error (`SsaCalibration`,
//! `CavityQLoadedCalibration`, ...).

use tokio::time::sleep;
use tracing::{debug, info};

use crate::channel::{Channel, ReadMode};
use crate::config::TimingSettings;
use crate::constants::{CALIBRATION_CRASHED_VALUE, CALIBRATION_RUNNING_VALUE};
use crate::error::{LinacError, LinacResult};

/// Start the calibration script behind `start` and block until `status`
/// leaves its running state. A crashed script, or any channel fault during
/// the sequence, raises the caller's failure type.
pub async fn run_calibration(
    start: &Channel,
    status: &Channel,
    timing: &TimingSettings,
    mk_err: impl Fn(String) -> LinacError,
) -> LinacResult<()> {
    debug!(start = %start.name(), "starting calibration script");
    start
        .put(1i64)
        .await
        .map_err(|err| mk_err(err.to_string()))?;

    // Give the script time to flip its status to running.
    sleep(timing.calibration_start_settle).await;

    loop {
        let state = status
            .get_i64(ReadMode::Fetch)
            .await
            .map_err(|err| mk_err(err.to_string()))?;
        if state != CALIBRATION_RUNNING_VALUE {
            break;
        }
        debug!(status = %status.name(), "calibration still running");
        sleep(timing.poll_interval).await;
    }

    // Let the final status settle before judging it.
    sleep(timing.calibration_start_settle).await;

    let state = status
        .get_i64(ReadMode::Fetch)
        .await
        .map_err(|err| mk_err(err.to_string()))?;
    if state == CALIBRATION_CRASHED_VALUE {
        return Err(mk_err(format!("{} crashed", status.name())));
    }

    info!(status = %status.name(), "calibration script complete");
    Ok(())
}

/// Validate `measured` against the open interval (`lower`, `upper`) and, if
/// in range, write the push and save process channels. An out-of-range result
/// raises the caller's failure type and writes nothing, leaving the persisted
/// operating value untouched.
pub async fn push_and_save_in_range(
    measured: &Channel,
    lower: f64,
    upper: f64,
    push: &Channel,
    save: &Channel,
    mk_err: impl Fn(String) -> LinacError,
) -> LinacResult<()> {
    let value = measured.get_f64(ReadMode::Cached).await?;
    if lower < value && value < upper {
        info!(measured = %measured.name(), value, "calibration result in range, pushing");
        push.put(1i64).await?;
        save.put(1i64).await?;
        Ok(())
    } else {
        Err(mk_err(format!(
            "{}: {value} not between {lower} and {upper}",
            measured.name()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::mock::MockProvider;
    use crate::channel::{ChannelRegistry, ChannelValue, RetryPolicy};
    use std::sync::Arc;

    fn registry() -> (Arc<MockProvider>, ChannelRegistry) {
        let provider = Arc::new(MockProvider::new());
        let registry = ChannelRegistry::new(provider.clone(), RetryPolicy::immediate(2));
        (provider, registry)
    }

    #[tokio::test]
    async fn completed_sequence_succeeds() {
        let (provider, registry) = registry();
        provider.script_reads(
            "CALSTS",
            [
                ChannelValue::Int(2),
                ChannelValue::Int(2),
                ChannelValue::Int(1),
                ChannelValue::Int(1),
            ],
        );

        let start = registry.channel("CALSTRT");
        let status = registry.channel("CALSTS");
        run_calibration(
            &start,
            &status,
            &TimingSettings::immediate(),
            LinacError::SsaCalibration,
        )
        .await
        .unwrap();

        assert_eq!(provider.puts_for("CALSTRT"), vec![ChannelValue::Int(1)]);
    }

    #[tokio::test]
    async fn crashed_sequence_raises_given_failure() {
        let (provider, registry) = registry();
        provider.script_reads("CALSTS", [ChannelValue::Int(2), ChannelValue::Int(0), ChannelValue::Int(0)]);

        let result = run_calibration(
            &registry.channel("CALSTRT"),
            &registry.channel("CALSTS"),
            &TimingSettings::immediate(),
            LinacError::SsaCalibration,
        )
        .await;

        assert!(matches!(result, Err(LinacError::SsaCalibration(_))));
    }

    #[tokio::test]
    async fn out_of_range_result_never_pushes() {
        let (provider, registry) = registry();
        provider.set("SLOPE_NEW", 2.5);

        let result = push_and_save_in_range(
            &registry.channel("SLOPE_NEW"),
            0.3,
            2.0,
            &registry.channel("PUSH"),
            &registry.channel("SAVE"),
            LinacError::SsaCalibration,
        )
        .await;

        assert!(matches!(result, Err(LinacError::SsaCalibration(_))));
        assert!(provider.puts_for("PUSH").is_empty());
        assert!(provider.puts_for("SAVE").is_empty());
    }

    #[tokio::test]
    async fn in_range_result_pushes_and_saves() {
        let (provider, registry) = registry();
        provider.set("SLOPE_NEW", 1.1);

        push_and_save_in_range(
            &registry.channel("SLOPE_NEW"),
            0.3,
            2.0,
            &registry.channel("PUSH"),
            &registry.channel("SAVE"),
            LinacError::SsaCalibration,
        )
        .await
        .unwrap();

        assert_eq!(provider.puts_for("PUSH"), vec![ChannelValue::Int(1)]);
        assert_eq!(provider.puts_for("SAVE"), vec![ChannelValue::Int(1)]);
    }
}
