//! Hardware device model: amplifiers, cavities, tuners, magnets, heaters.
//!
//! Every device owns a fixed set of channels scoped to its physical identity.
//! Instead of child-to-parent back-references, each device carries the
//! identity values (linac name, cryomodule name, rack, cavity number) it
//! needs to derive its channel names.

pub mod capabilities;
mod cavity;
mod heater;
mod magnet;
mod ssa;
mod tuner;

pub use cavity::Cavity;
pub use heater::Heater;
pub use magnet::Magnet;
pub use ssa::Ssa;
pub use tuner::StepperTuner;

use crate::naming;

/// Physical identity of one cavity, sufficient to derive every channel name
/// it owns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CavityId {
    /// Linac segment name, e.g. "L1B".
    pub linac: String,
    /// Cryomodule name: two-digit number or "H1"/"H2".
    pub cryomodule: String,
    pub is_harmonic_linearizer: bool,
    /// Rack letter, 'A' or 'B'.
    pub rack: char,
    /// Cavity number 1-8.
    pub number: u8,
}

impl CavityId {
    /// `ACCL:{linac}:{cm}{cavity}0:`, the prefix for this cavity's channels.
    pub fn channel_prefix(&self) -> String {
        naming::cavity_prefix(&self.linac, &self.cryomodule, self.number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cavity_id_prefix() {
        let id = CavityId {
            linac: "L1B".into(),
            cryomodule: "H1".into(),
            is_harmonic_linearizer: true,
            rack: 'B',
            number: 5,
        };
        assert_eq!(id.channel_prefix(), "ACCL:L1B:H150:");
    }
}
