//! Device capability contracts.
//!
//! Small async traits for the operations shared across device kinds, so
//! orchestration code can drive "anything that powers on" or "anything that
//! calibrates" without naming a concrete device type. These traits are also
//! the substitution seam for alternate device implementations at
//! topology-build time.

use async_trait::async_trait;

use crate::error::LinacResult;

use super::{Cavity, Magnet, Ssa};

/// Devices with a commanded on/off power state.
#[async_trait]
pub trait PowerControl: Send + Sync {
    async fn set_power_state(&self, turn_on: bool) -> LinacResult<()>;

    async fn turn_on(&self) -> LinacResult<()> {
        self.set_power_state(true).await
    }

    async fn turn_off(&self) -> LinacResult<()> {
        self.set_power_state(false).await
    }
}

/// Devices with a hardware-driven calibration sequence.
#[async_trait]
pub trait Calibrate: Send + Sync {
    async fn run_calibration(&self) -> LinacResult<()>;
}

#[async_trait]
impl PowerControl for Ssa {
    async fn set_power_state(&self, turn_on: bool) -> LinacResult<()> {
        Ssa::set_power_state(self, turn_on).await
    }
}

#[async_trait]
impl Calibrate for Ssa {
    async fn run_calibration(&self) -> LinacResult<()> {
        Ssa::run_calibration(self).await
    }
}

#[async_trait]
impl PowerControl for Cavity {
    async fn set_power_state(&self, turn_on: bool) -> LinacResult<()> {
        Cavity::set_power_state(self, turn_on).await
    }
}

#[async_trait]
impl Calibrate for Cavity {
    async fn run_calibration(&self) -> LinacResult<()> {
        self.run_calibration_default().await
    }
}

#[async_trait]
impl PowerControl for Magnet {
    async fn set_power_state(&self, turn_on: bool) -> LinacResult<()> {
        if turn_on {
            Magnet::turn_on(self).await
        } else {
            Magnet::turn_off(self).await
        }
    }
}
