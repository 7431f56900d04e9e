//! Sentinel values, limits, and nominal settings for the machine.
//!
//! These values are part of the external contract with the existing control
//! network: status enums are matched against them and command channels are
//! written with them. They must not drift from the deployed databases.

// Calibration script status values
pub const CALIBRATION_CRASHED_VALUE: i64 = 0;
pub const CALIBRATION_COMPLETE_VALUE: i64 = 1;
pub const CALIBRATION_RUNNING_VALUE: i64 = 2;

// SSA status message values
pub const SSA_STATUS_ON_VALUE: i64 = 3;
pub const SSA_STATUS_FAULTED_VALUE: i64 = 1;
pub const SSA_STATUS_OFF_VALUE: i64 = 2;
pub const SSA_STATUS_RESETTING_FAULTS_VALUE: i64 = 4;
pub const SSA_STATUS_FAULT_RESET_FAILED_VALUE: i64 = 7;

pub const SSA_SLOPE_LOWER_LIMIT: f64 = 0.3;
pub const SSA_SLOPE_UPPER_LIMIT: f64 = 2.0;

pub const LOADED_Q_LOWER_LIMIT: f64 = 2.5e7;
pub const LOADED_Q_UPPER_LIMIT: f64 = 5.1e7;
pub const DESIGN_Q_LOADED: f64 = 4.1e7;

// Harmonic-linearizer cavities have a different coupler design
pub const LOADED_Q_LOWER_LIMIT_HL: f64 = 1.5e7;
pub const LOADED_Q_UPPER_LIMIT_HL: f64 = 3.5e7;
pub const DESIGN_Q_LOADED_HL: f64 = 2.5e7;

pub const CAVITY_SCALE_LOWER_LIMIT: f64 = 8.0;
pub const CAVITY_SCALE_UPPER_LIMIT: f64 = 125.0;

// RF mode enum values
pub const RF_MODE_SELAP: i64 = 0;
pub const RF_MODE_SELA: i64 = 1;
pub const RF_MODE_SEL: i64 = 2;
pub const RF_MODE_SEL_RAW: i64 = 3;
pub const RF_MODE_PULSE: i64 = 4;
pub const RF_MODE_CHIRP: i64 = 5;

pub const SAFE_PULSED_DRIVE_LEVEL: i64 = 10;
/// Drive level written at the start of a probe calibration.
pub const CALIBRATION_DRIVE_LEVEL: i64 = 15;
/// Pulsed-mode on time (ms); waveform-derived quantities assume this value.
pub const NOMINAL_PULSED_ONTIME: f64 = 70.0;

/// Pulse status value at which changes have settled; anything past it is an
/// overshoot fault.
pub const PULSE_STATUS_SETTLED_VALUE: i64 = 2;

// Stepper tuner limits (steps and steps/second)
pub const STEPPER_TEMP_LIMIT: f64 = 70.0;
pub const DEFAULT_STEPPER_MAX_STEPS: i64 = 1_000_000;
pub const DEFAULT_STEPPER_SPEED: i64 = 20_000;
pub const MAX_STEPPER_SPEED: i64 = 60_000;
pub const STEPPER_ON_LIMIT_SWITCH_VALUE: i64 = 1;

// Magnet power supply CTRL enum states, probed from the deployed supplies
pub const MAGNET_TRIM_VALUE: i64 = 1;
pub const MAGNET_RESET_VALUE: i64 = 10;
pub const MAGNET_ON_VALUE: i64 = 11;
pub const MAGNET_OFF_VALUE: i64 = 12;
pub const MAGNET_DEGAUSS_VALUE: i64 = 13;

// Cavity geometry per variant
pub const CAVITY_LENGTH_M: f64 = 1.038;
pub const CAVITY_FREQUENCY_HZ: f64 = 1.3e9;
pub const HL_CAVITY_LENGTH_M: f64 = 0.346;
pub const HL_CAVITY_FREQUENCY_HZ: f64 = 3.9e9;

pub const MICROSTEPS_PER_STEP: f64 = 256.0;
pub const HZ_PER_STEP: f64 = 1.4;
pub const HL_HZ_PER_STEP: f64 = 18.3;

/// Rough empirical tuning sensitivities.
pub const ESTIMATED_MICROSTEPS_PER_HZ: f64 = MICROSTEPS_PER_STEP / HZ_PER_STEP;
pub const ESTIMATED_MICROSTEPS_PER_HZ_HL: f64 = MICROSTEPS_PER_STEP / HL_HZ_PER_STEP;
