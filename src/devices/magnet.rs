//! Corrector/quadrupole magnet power-supply wrapper.
//!
//! Stateless command surface: setting the desired field writes the setpoint
//! then issues a trim; reset/on/off/degauss each write one sentinel to the
//! control channel. Retry behavior comes entirely from the channel layer.

use crate::channel::{Channel, ChannelRegistry, ReadMode};
use crate::constants::{
    MAGNET_DEGAUSS_VALUE, MAGNET_OFF_VALUE, MAGNET_ON_VALUE, MAGNET_RESET_VALUE,
    MAGNET_TRIM_VALUE,
};
use crate::error::LinacResult;
use crate::naming;

pub struct Magnet {
    magnet_type: String,
    bdes: Channel,
    control: Channel,
    interlock_summary: Channel,
    ps_status: Channel,
    bact: Channel,
    iact: Channel,
    // Writing IDES perturbs the beam immediately; exposed read-only.
    ides: Channel,
}

impl Magnet {
    pub fn new(
        registry: &ChannelRegistry,
        magnet_type: &str,
        linac: &str,
        cryomodule: &str,
    ) -> Self {
        let prefix = naming::magnet_prefix(magnet_type, linac, cryomodule);
        Self {
            magnet_type: magnet_type.to_owned(),
            bdes: registry.channel(format!("{prefix}BDES")),
            control: registry.channel(format!("{prefix}CTRL")),
            interlock_summary: registry.channel(format!("{prefix}INTLKSUMY")),
            ps_status: registry.channel(format!("{prefix}STATE")),
            bact: registry.channel(format!("{prefix}BACT")),
            iact: registry.channel(format!("{prefix}IACT")),
            ides: registry.channel(format!("{prefix}IDES")),
        }
    }

    pub fn magnet_type(&self) -> &str {
        &self.magnet_type
    }

    pub async fn bdes(&self) -> LinacResult<f64> {
        self.bdes.get_f64(ReadMode::Cached).await
    }

    /// Write the desired field and trim the supply onto it.
    pub async fn set_bdes(&self, value: f64) -> LinacResult<()> {
        self.bdes.put(value).await?;
        self.control.put(MAGNET_TRIM_VALUE).await
    }

    pub async fn reset(&self) -> LinacResult<()> {
        self.control.put(MAGNET_RESET_VALUE).await
    }

    pub async fn turn_on(&self) -> LinacResult<()> {
        self.control.put(MAGNET_ON_VALUE).await
    }

    pub async fn turn_off(&self) -> LinacResult<()> {
        self.control.put(MAGNET_OFF_VALUE).await
    }

    pub async fn degauss(&self) -> LinacResult<()> {
        self.control.put(MAGNET_DEGAUSS_VALUE).await
    }

    pub async fn bact(&self) -> LinacResult<f64> {
        self.bact.get_f64(ReadMode::Cached).await
    }

    pub async fn iact(&self) -> LinacResult<f64> {
        self.iact.get_f64(ReadMode::Cached).await
    }

    pub async fn ides(&self) -> LinacResult<f64> {
        self.ides.get_f64(ReadMode::Cached).await
    }

    pub async fn interlock_summary(&self) -> LinacResult<i64> {
        self.interlock_summary.get_i64(ReadMode::Cached).await
    }

    pub async fn ps_status(&self) -> LinacResult<i64> {
        self.ps_status.get_i64(ReadMode::Cached).await
    }
}
