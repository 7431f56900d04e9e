//! Accelerator topology: racks, cryomodules, linac segments.
//!
//! Pure structural assembly with no retries of its own: fixed parent/child
//! relationships built from the static name tables. Parents own children;
//! children carry identity values instead of back-references. The one
//! structural exception is the harmonic linearizer, where each follower
//! cavity's SSA handle is re-pointed at its leader's instance after
//! construction, so a calibration through either cavity is visible through
//! both.

pub mod tables;

use std::collections::BTreeMap;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use tracing::debug;

use crate::channel::{Channel, ChannelRegistry};
use crate::config::TimingSettings;
use crate::devices::{Cavity, CavityId, Magnet};
use crate::error::{LinacError, LinacResult};
use crate::naming;

/// One rack of four cavities. Rack A always holds cavities 1-4, rack B 5-8;
/// any other rack letter is a construction-time error.
pub struct Rack {
    pub letter: char,
    pub channel_prefix: String,
    pub cavities: BTreeMap<u8, Cavity>,
}

impl Rack {
    pub fn new(
        registry: &ChannelRegistry,
        linac: &str,
        cryomodule: &str,
        is_harmonic_linearizer: bool,
        letter: char,
        timing: &TimingSettings,
    ) -> LinacResult<Self> {
        let numbers: std::ops::RangeInclusive<u8> = match letter {
            'A' => 1..=4,
            'B' => 5..=8,
            other => {
                return Err(LinacError::Topology(format!("bad rack name '{other}'")));
            }
        };

        let cm_prefix = naming::cryomodule_prefix(linac, cryomodule);
        let mut cavities = BTreeMap::new();
        for number in numbers {
            let id = CavityId {
                linac: linac.to_owned(),
                cryomodule: cryomodule.to_owned(),
                is_harmonic_linearizer,
                rack: letter,
                number,
            };
            cavities.insert(number, Cavity::new(registry, id, timing.clone()));
        }

        Ok(Self {
            letter,
            channel_prefix: naming::rack_prefix(&cm_prefix, letter),
            cavities,
        })
    }
}

/// Cryo-plant channels scoped to one cryomodule.
pub struct CryoPlant {
    pub cte_prefix: String,
    pub cvt_prefix: String,
    pub cpv_prefix: String,
    pub jt_prefix: String,
    pub downstream_level: Channel,
    pub upstream_level: Channel,
    pub downstream_pressure: Channel,
    pub jt_valve_readback: Channel,
}

pub struct Cryomodule {
    pub name: String,
    pub linac_name: String,
    pub is_harmonic_linearizer: bool,
    pub channel_prefix: String,
    /// Focusing/steering magnets; harmonic linearizers carry none.
    pub quad: Option<Magnet>,
    pub xcor: Option<Magnet>,
    pub ycor: Option<Magnet>,
    pub rack_a: Rack,
    pub rack_b: Rack,
    pub cryo: CryoPlant,
    pub coupler_vacuum: Vec<Channel>,
    /// Names of every vacuum channel relevant to this cryomodule: its own
    /// coupler gauges plus the owning linac's beamline and insulating groups.
    pub vacuum_channel_names: Vec<String>,
}

impl Cryomodule {
    #[allow(clippy::too_many_arguments)]
    fn new(
        registry: &ChannelRegistry,
        linac: &str,
        vacuum_prefix: &str,
        name: &str,
        is_harmonic_linearizer: bool,
        linac_vacuum_names: &[String],
        timing: &TimingSettings,
    ) -> LinacResult<Self> {
        let rack_a = Rack::new(registry, linac, name, is_harmonic_linearizer, 'A', timing)?;
        let rack_b = Rack::new(registry, linac, name, is_harmonic_linearizer, 'B', timing)?;

        let (quad, xcor, ycor) = if is_harmonic_linearizer {
            (None, None, None)
        } else {
            (
                Some(Magnet::new(registry, "QUAD", linac, name)),
                Some(Magnet::new(registry, "XCOR", linac, name)),
                Some(Magnet::new(registry, "YCOR", linac, name)),
            )
        };

        let cryo = CryoPlant {
            cte_prefix: naming::cte_prefix(name),
            cvt_prefix: naming::cvt_prefix(name),
            cpv_prefix: naming::cpv_prefix(name),
            jt_prefix: naming::jt_prefix(name),
            downstream_level: registry.channel(naming::downstream_level(name)),
            upstream_level: registry.channel(naming::upstream_level(name)),
            downstream_pressure: registry.channel(naming::downstream_pressure(name)),
            jt_valve_readback: registry.channel(format!("{}ORBV", naming::jt_prefix(name))),
        };

        let coupler_vacuum: Vec<Channel> =
            naming::coupler_vacuum(vacuum_prefix, name, is_harmonic_linearizer)
                .into_iter()
                .map(|n| registry.channel(n))
                .collect();

        let mut vacuum_channel_names: Vec<String> =
            coupler_vacuum.iter().map(|c| c.name().to_owned()).collect();
        vacuum_channel_names.extend(linac_vacuum_names.iter().cloned());

        let mut cryomodule = Self {
            name: name.to_owned(),
            linac_name: linac.to_owned(),
            is_harmonic_linearizer,
            channel_prefix: naming::cryomodule_prefix(linac, name),
            quad,
            xcor,
            ycor,
            rack_a,
            rack_b,
            cryo,
            coupler_vacuum,
            vacuum_channel_names,
        };

        if is_harmonic_linearizer {
            cryomodule.share_ssas();
        }
        Ok(cryomodule)
    }

    /// Re-point each follower cavity's SSA handle at its leader's instance.
    fn share_ssas(&mut self) {
        for (leader, follower) in tables::HL_SSA_SHARED_PAIRS {
            let shared: Arc<_> = match self.rack_a.cavities.get(&leader) {
                Some(cavity) => cavity.ssa.clone(),
                None => continue,
            };
            if let Some(cavity) = self.rack_b.cavities.get_mut(&follower) {
                debug!(cryomodule = %self.name, leader, follower, "sharing SSA across cavity pair");
                cavity.ssa = shared;
            }
        }
    }

    /// The cavity with this number (1-8), if present.
    pub fn cavity(&self, number: u8) -> Option<&Cavity> {
        self.rack_a
            .cavities
            .get(&number)
            .or_else(|| self.rack_b.cavities.get(&number))
    }

    /// All eight cavities in number order.
    pub fn cavities(&self) -> impl Iterator<Item = &Cavity> {
        self.rack_a
            .cavities
            .values()
            .chain(self.rack_b.cavities.values())
    }

    /// The magnets this cryomodule carries.
    pub fn magnets(&self) -> impl Iterator<Item = &Magnet> {
        [self.quad.as_ref(), self.xcor.as_ref(), self.ycor.as_ref()]
            .into_iter()
            .flatten()
    }
}

pub struct Linac {
    pub name: String,
    pub vacuum_prefix: String,
    pub beamline_vacuum: Vec<Channel>,
    pub insulating_vacuum: Vec<Channel>,
    pub cryomodules: BTreeMap<String, Cryomodule>,
}

impl Linac {
    pub fn new(
        registry: &ChannelRegistry,
        name: &str,
        beamline_vacuum_infixes: &[&str],
        insulating_vacuum_cryomodules: &[&str],
    ) -> Self {
        let vacuum_prefix = naming::vacuum_prefix(name);
        let beamline_vacuum = beamline_vacuum_infixes
            .iter()
            .map(|infix| registry.channel(naming::beamline_vacuum(&vacuum_prefix, infix)))
            .collect();
        let insulating_vacuum = insulating_vacuum_cryomodules
            .iter()
            .map(|cm| registry.channel(naming::insulating_vacuum(&vacuum_prefix, cm)))
            .collect();

        Self {
            name: name.to_owned(),
            vacuum_prefix,
            beamline_vacuum,
            insulating_vacuum,
            cryomodules: BTreeMap::new(),
        }
    }

    /// Names of this linac's beamline and insulating vacuum channels.
    fn vacuum_channel_names(&self) -> Vec<String> {
        self.beamline_vacuum
            .iter()
            .chain(self.insulating_vacuum.iter())
            .map(|c| c.name().to_owned())
            .collect()
    }

    pub fn add_cryomodule(
        &mut self,
        registry: &ChannelRegistry,
        name: &str,
        is_harmonic_linearizer: bool,
        timing: &TimingSettings,
    ) -> LinacResult<()> {
        let cryomodule = Cryomodule::new(
            registry,
            &self.name,
            &self.vacuum_prefix,
            name,
            is_harmonic_linearizer,
            &self.vacuum_channel_names(),
            timing,
        )?;
        self.cryomodules.insert(name.to_owned(), cryomodule);
        Ok(())
    }
}

/// The full fixed accelerator topology.
pub struct Topology {
    pub linacs: Vec<Linac>,
}

impl Topology {
    /// Build the complete machine from the static tables.
    pub fn build(registry: &ChannelRegistry, timing: &TimingSettings) -> LinacResult<Self> {
        let mut linacs = Vec::with_capacity(tables::LINAC_TUPLES.len());

        for (idx, (name, cryomodules)) in tables::LINAC_TUPLES.iter().enumerate() {
            let mut linac = Linac::new(
                registry,
                name,
                tables::BEAMLINE_VACUUM_INFIXES[idx],
                tables::INSULATING_VACUUM_CRYOMODULES[idx],
            );
            for cm in *cryomodules {
                linac.add_cryomodule(registry, cm, false, timing)?;
            }
            linacs.push(linac);
        }

        for cm in tables::L1BHL {
            linacs[tables::HL_LINAC_INDEX].add_cryomodule(registry, cm, true, timing)?;
        }

        Ok(Self { linacs })
    }

    /// The cryomodule with this name, searching all linac segments.
    pub fn cryomodule(&self, name: &str) -> Option<&Cryomodule> {
        self.linacs
            .iter()
            .find_map(|linac| linac.cryomodules.get(name))
    }

    pub fn cryomodules(&self) -> impl Iterator<Item = &Cryomodule> {
        self.linacs.iter().flat_map(|l| l.cryomodules.values())
    }

    pub fn cryomodule_count(&self) -> usize {
        self.linacs.iter().map(|l| l.cryomodules.len()).sum()
    }

    pub fn cavity_count(&self) -> usize {
        self.cryomodules().map(|cm| cm.cavities().count()).sum()
    }
}

static GLOBAL_TOPOLOGY: OnceCell<Topology> = OnceCell::new();

/// Install the process-wide topology, built once at startup.
///
/// Fails if a topology is already installed; there is no implicit
/// reconstruction. Tests should build isolated `Topology` instances instead.
pub fn install(topology: Topology) -> LinacResult<&'static Topology> {
    let mut fresh = false;
    let installed = GLOBAL_TOPOLOGY.get_or_init(|| {
        fresh = true;
        topology
    });
    if fresh {
        Ok(installed)
    } else {
        Err(LinacError::Topology("topology already installed".into()))
    }
}

/// The process-wide topology, if one has been installed.
pub fn global() -> Option<&'static Topology> {
    GLOBAL_TOPOLOGY.get()
}
