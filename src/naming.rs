//! Deterministic channel-name construction.
//!
//! Every channel name is derived from the linac name, cryomodule name
//! (two-digit number or "H1"/"H2"), rack letter, cavity number (1-8), and a
//! fixed suffix. These formats are the external contract with the deployed
//! control network and must be reproduced bit-exact.

/// `ACCL:{linac}:{cm}{cavity}0:`, the prefix for one cavity's RF channels.
pub fn cavity_prefix(linac: &str, cryomodule: &str, cavity: u8) -> String {
    format!("ACCL:{linac}:{cryomodule}{cavity}0:")
}

/// `CTE:CM{cm}:1{cavity}`, the cavity temperature-element prefix.
pub fn cavity_cte_prefix(cryomodule: &str, cavity: u8) -> String {
    format!("CTE:CM{cryomodule}:1{cavity}")
}

/// `CHTR:CM{cm}:1{cavity}55:HV:`, the cavity heater prefix.
pub fn heater_prefix(cryomodule: &str, cavity: u8) -> String {
    format!("CHTR:CM{cryomodule}:1{cavity}55:HV:")
}

/// `ACCL:{linac}:{cm}00:`, the prefix for cryomodule-scoped RF channels.
pub fn cryomodule_prefix(linac: &str, cryomodule: &str) -> String {
    format!("ACCL:{linac}:{cryomodule}00:")
}

/// `{prefix}RACK{rack}:`, the rack prefix under a cryomodule prefix.
pub fn rack_prefix(cryomodule_prefix: &str, rack: char) -> String {
    format!("{cryomodule_prefix}RACK{rack}:")
}

/// `{magnet}:{linac}:{cm}85:`, the magnet power-supply prefix.
pub fn magnet_prefix(magnet_type: &str, linac: &str, cryomodule: &str) -> String {
    format!("{magnet_type}:{linac}:{cryomodule}85:")
}

// Cryo-plant prefixes scoped to a cryomodule

pub fn cte_prefix(cryomodule: &str) -> String {
    format!("CTE:CM{cryomodule}:")
}

pub fn cvt_prefix(cryomodule: &str) -> String {
    format!("CVT:CM{cryomodule}:")
}

pub fn cpv_prefix(cryomodule: &str) -> String {
    format!("CPV:CM{cryomodule}:")
}

pub fn jt_prefix(cryomodule: &str) -> String {
    format!("CLIC:CM{cryomodule}:3001:PVJT:")
}

pub fn downstream_level(cryomodule: &str) -> String {
    format!("CLL:CM{cryomodule}:2301:DS:LVL")
}

pub fn upstream_level(cryomodule: &str) -> String {
    format!("CLL:CM{cryomodule}:2601:US:LVL")
}

pub fn downstream_pressure(cryomodule: &str) -> String {
    format!("CPT:CM{cryomodule}:2303:DS:PRESS")
}

/// `VGXX:{linac}:`, the vacuum gauge prefix for a linac segment.
pub fn vacuum_prefix(linac: &str) -> String {
    format!("VGXX:{linac}:")
}

/// `{vacuum_prefix}{infix}:COMBO_P`, a beamline vacuum gauge.
pub fn beamline_vacuum(vacuum_prefix: &str, infix: &str) -> String {
    format!("{vacuum_prefix}{infix}:COMBO_P")
}

/// `{vacuum_prefix}{cm}96:COMBO_P`, an insulating vacuum gauge.
pub fn insulating_vacuum(vacuum_prefix: &str, cryomodule: &str) -> String {
    format!("{vacuum_prefix}{cryomodule}96:COMBO_P")
}

/// Coupler vacuum gauges for a cryomodule; harmonic linearizers carry two.
pub fn coupler_vacuum(vacuum_prefix: &str, cryomodule: &str, is_harmonic_linearizer: bool) -> Vec<String> {
    if is_harmonic_linearizer {
        vec![
            format!("{vacuum_prefix}{cryomodule}09:COMBO_P"),
            format!("{vacuum_prefix}{cryomodule}19:COMBO_P"),
        ]
    } else {
        vec![format!("{vacuum_prefix}{cryomodule}14:COMBO_P")]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cavity_prefix_is_bit_exact() {
        assert_eq!(cavity_prefix("L1B", "02", 1), "ACCL:L1B:0210:");
        assert_eq!(cavity_prefix("L1B", "H1", 5), "ACCL:L1B:H150:");
    }

    #[test]
    fn heater_and_cte_prefixes() {
        assert_eq!(heater_prefix("02", 3), "CHTR:CM02:1355:HV:");
        assert_eq!(cavity_cte_prefix("02", 3), "CTE:CM02:13");
    }

    #[test]
    fn cryomodule_and_rack_prefixes() {
        let cm = cryomodule_prefix("L0B", "01");
        assert_eq!(cm, "ACCL:L0B:0100:");
        assert_eq!(rack_prefix(&cm, 'A'), "ACCL:L0B:0100:RACKA:");
    }

    #[test]
    fn magnet_prefix_is_bit_exact() {
        assert_eq!(magnet_prefix("QUAD", "L1B", "03"), "QUAD:L1B:0385:");
        assert_eq!(magnet_prefix("XCOR", "L2B", "10"), "XCOR:L2B:1085:");
    }

    #[test]
    fn cryo_plant_names() {
        assert_eq!(jt_prefix("16"), "CLIC:CM16:3001:PVJT:");
        assert_eq!(downstream_level("16"), "CLL:CM16:2301:DS:LVL");
        assert_eq!(upstream_level("16"), "CLL:CM16:2601:US:LVL");
        assert_eq!(downstream_pressure("16"), "CPT:CM16:2303:DS:PRESS");
    }

    #[test]
    fn vacuum_names() {
        let prefix = vacuum_prefix("L1B");
        assert_eq!(prefix, "VGXX:L1B:");
        assert_eq!(beamline_vacuum(&prefix, "0202"), "VGXX:L1B:0202:COMBO_P");
        assert_eq!(insulating_vacuum(&prefix, "02"), "VGXX:L1B:0296:COMBO_P");
        assert_eq!(
            coupler_vacuum(&prefix, "H1", true),
            vec!["VGXX:L1B:H109:COMBO_P", "VGXX:L1B:H119:COMBO_P"]
        );
        assert_eq!(
            coupler_vacuum(&prefix, "02", false),
            vec!["VGXX:L1B:0214:COMBO_P"]
        );
    }
}
