//! # Superconducting Linac Control Library
//!
//! This crate models a superconducting RF linac as a tree of hardware
//! objects (amplifiers, cavities, motorized tuners, magnets, cryomodules)
//! and drives them through a remote, named-channel control interface. Two
//! subsystems carry most of the weight:
//!
//! - the **channel layer** (`channel`), which wraps a flaky asynchronous
//!   control network behind simple get/put semantics with a bounded
//!   retry/fallback policy and shared-by-name channel instances, and
//! - the **orchestration layer** (`devices` + `calibration`), which
//!   implements the multi-step calibration sequences, the segmented-motion
//!   algorithm with its temperature interlock, and the power state machines
//!   for amplifiers and cavities.
//!
//! ## Crate Structure
//!
//! - **`channel`**: resilient named-channel access over a pluggable
//!   provider, plus the in-memory mock provider used by tests and the demo
//!   binary.
//! - **`devices`**: the hardware device model (SSA, cavity, stepper tuner,
//!   magnet, heater) and the capability traits shared across device kinds.
//! - **`calibration`**: generic calibration-sequence runner and
//!   validate-then-persist helper.
//! - **`topology`**: rack/cryomodule/linac composition, the static machine
//!   tables, and the process-wide topology factory.
//! - **`naming`**: bit-exact channel-name derivation from device identity.
//! - **`constants`**: sentinel values and limits shared with the deployed
//!   control databases.
//! - **`config`**: TOML/env settings for retry policy and orchestration
//!   timing.
//! - **`error`**: the `LinacError` taxonomy.
//! - **`logging`**: tracing subscriber setup for binaries.

pub mod calibration;
pub mod channel;
pub mod config;
pub mod constants;
pub mod devices;
pub mod error;
pub mod logging;
pub mod naming;
pub mod topology;

pub use error::{LinacError, LinacResult};
