//! Segmented-motion behavior of the stepper tuner: segment decomposition,
//! one-time limit writes, harmonic-linearizer direction inversion, and the
//! temperature interlock.

use std::sync::Arc;
use std::time::Duration;

use sc_linac::channel::mock::MockProvider;
use sc_linac::channel::{ChannelRegistry, ChannelUpdate, ChannelValue, RetryPolicy};
use sc_linac::config::TimingSettings;
use sc_linac::constants::{DEFAULT_STEPPER_MAX_STEPS, DEFAULT_STEPPER_SPEED, MAX_STEPPER_SPEED};
use sc_linac::devices::StepperTuner;
use sc_linac::LinacError;

const PREFIX: &str = "ACCL:L1B:0210:";

fn setup(invert: bool) -> (Arc<MockProvider>, StepperTuner) {
    let provider = Arc::new(MockProvider::new());
    let registry = ChannelRegistry::new(provider.clone(), RetryPolicy::immediate(2));

    // Motor idle and done; temperature well below the interlock limit.
    provider.set(&format!("{PREFIX}STEP:STAT_MOV"), 0i64);
    provider.set(&format!("{PREFIX}STEP:STAT_DONE"), 1i64);
    provider.set(&format!("{PREFIX}STEPTEMP"), 30.0);

    let tuner = StepperTuner::new(&registry, PREFIX, invert, TimingSettings::immediate());
    (provider, tuner)
}

fn int_puts(provider: &MockProvider, suffix: &str) -> Vec<i64> {
    provider
        .puts_for(&format!("{PREFIX}STEP:{suffix}"))
        .iter()
        .filter_map(ChannelValue::as_i64)
        .collect()
}

#[tokio::test]
async fn large_move_is_segmented_with_exact_sum() {
    let (provider, tuner) = setup(false);

    tuner.move_steps(250, 100, 50, true).await.unwrap();

    // +100, +100, +50 in that order
    assert_eq!(int_puts(&provider, "NSTEPS"), vec![100, 100, 50]);
    assert_eq!(int_puts(&provider, "MOV_REQ_POS").len(), 3);
    assert!(int_puts(&provider, "MOV_REQ_NEG").is_empty());
}

#[tokio::test]
async fn negative_move_sums_to_requested_steps() {
    let (provider, tuner) = setup(false);

    tuner.move_steps(-230, 100, 50, true).await.unwrap();

    let segments = int_puts(&provider, "NSTEPS");
    assert_eq!(segments, vec![-100, -100, -30]);
    assert_eq!(segments.iter().sum::<i64>(), -230);
    assert!(segments.iter().all(|s| s.abs() <= 100));
    assert_eq!(int_puts(&provider, "MOV_REQ_NEG").len(), 3);
}

#[tokio::test]
async fn limits_are_written_once_before_first_segment() {
    let (provider, tuner) = setup(false);

    tuner.move_steps(250, 100, 50, true).await.unwrap();

    // One limit write up front, one restore to defaults at the end.
    assert_eq!(
        int_puts(&provider, "NSTEPS.DRVH"),
        vec![100, DEFAULT_STEPPER_MAX_STEPS]
    );
    assert_eq!(int_puts(&provider, "VELO"), vec![50, DEFAULT_STEPPER_SPEED]);
}

#[tokio::test]
async fn speed_is_capped_at_hard_ceiling() {
    let (provider, tuner) = setup(false);

    tuner.move_steps(10, 100, 90_000, true).await.unwrap();

    assert_eq!(
        int_puts(&provider, "VELO"),
        vec![MAX_STEPPER_SPEED, DEFAULT_STEPPER_SPEED]
    );
}

#[tokio::test]
async fn change_limits_false_writes_no_limits() {
    let (provider, tuner) = setup(false);

    tuner.move_steps(50, 100, 50, false).await.unwrap();

    // Only the restore-to-defaults write at move end.
    assert_eq!(
        int_puts(&provider, "NSTEPS.DRVH"),
        vec![DEFAULT_STEPPER_MAX_STEPS]
    );
}

#[tokio::test]
async fn harmonic_linearizer_inverts_command_direction() {
    let (provider, tuner) = setup(true);

    tuner.move_steps(150, 100, 50, true).await.unwrap();

    // Logical +150 becomes physical -150: negative-direction commands.
    assert_eq!(int_puts(&provider, "MOV_REQ_NEG").len(), 2);
    assert!(int_puts(&provider, "MOV_REQ_POS").is_empty());
    // The desired-step channel still carries the logical sign.
    assert_eq!(int_puts(&provider, "NSTEPS"), vec![100, 50]);
}

#[tokio::test]
async fn motor_not_done_raises_motor_error() {
    let (provider, tuner) = setup(false);
    provider.set(&format!("{PREFIX}STEP:STAT_DONE"), 0i64);

    assert!(matches!(
        tuner.move_steps(50, 100, 50, true).await,
        Err(LinacError::Motor(_))
    ));
}

#[tokio::test]
async fn busy_motor_is_polled_until_idle() {
    let (provider, tuner) = setup(false);
    provider.script_reads(
        &format!("{PREFIX}STEP:STAT_MOV"),
        [
            ChannelValue::Int(1),
            ChannelValue::Int(1),
            ChannelValue::Int(0),
        ],
    );

    tuner.move_steps(50, 100, 50, true).await.unwrap();
    assert_eq!(int_puts(&provider, "NSTEPS"), vec![50]);
}

#[tokio::test]
async fn over_temperature_update_writes_abort() {
    let (provider, tuner) = setup(false);
    provider.set(&format!("{PREFIX}STEPTEMP"), 75.0);

    tuner.arm_temperature_interlock().await.unwrap();
    provider.publish(
        &format!("{PREFIX}STEP:REG_TOTABS"),
        ChannelUpdate::new(ChannelValue::Int(1024)),
    );
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(int_puts(&provider, "ABORT_REQ"), vec![1]);
}

#[tokio::test]
async fn below_limit_temperature_does_not_abort() {
    let (provider, tuner) = setup(false);

    tuner.arm_temperature_interlock().await.unwrap();
    provider.publish(
        &format!("{PREFIX}STEP:REG_TOTABS"),
        ChannelUpdate::new(ChannelValue::Int(1024)),
    );
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert!(int_puts(&provider, "ABORT_REQ").is_empty());
}

#[tokio::test]
async fn non_positive_segment_limit_is_rejected() {
    let (_provider, tuner) = setup(false);

    assert!(matches!(
        tuner.move_steps(50, 0, 50, true).await,
        Err(LinacError::Motor(_))
    ));
}
