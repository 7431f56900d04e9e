//! Cavity heater: a resistive element used to balance cryogenic load.

use crate::channel::{Channel, ChannelRegistry, ReadMode};
use crate::error::LinacResult;
use crate::naming;

pub struct Heater {
    power_setpoint: Channel,
    power_readback: Channel,
}

impl Heater {
    pub fn new(registry: &ChannelRegistry, cryomodule: &str, cavity: u8) -> Self {
        let prefix = naming::heater_prefix(cryomodule, cavity);
        Self {
            power_setpoint: registry.channel(format!("{prefix}POWER_SETPT")),
            power_readback: registry.channel(format!("{prefix}POWER")),
        }
    }

    pub async fn set_power(&self, watts: f64) -> LinacResult<()> {
        self.power_setpoint.put(watts).await
    }

    pub async fn power(&self) -> LinacResult<f64> {
        self.power_readback.get_f64(ReadMode::Cached).await
    }
}
