//! Static machine layout tables.
//!
//! Fixed external configuration data describing the deployed accelerator:
//! which cryomodules sit in which linac segment, the vacuum-sensor groupings,
//! and the harmonic-linearizer membership. Not derived at runtime.

pub const L0B: &[&str] = &["01"];
pub const L1B: &[&str] = &["02", "03"];
pub const L1BHL: &[&str] = &["H1", "H2"];
pub const L2B: &[&str] = &[
    "04", "05", "06", "07", "08", "09", "10", "11", "12", "13", "14", "15",
];
pub const L3B: &[&str] = &[
    "16", "17", "18", "19", "20", "21", "22", "23", "24", "25", "26", "27", "28", "29", "30",
    "31", "32", "33", "34", "35",
];

/// Linac segment name with its (non-harmonic) cryomodules, in machine order.
pub const LINAC_TUPLES: [(&str, &[&str]); 4] =
    [("L0B", L0B), ("L1B", L1B), ("L2B", L2B), ("L3B", L3B)];

/// Index into `LINAC_TUPLES` of the segment carrying the harmonic linearizers.
pub const HL_LINAC_INDEX: usize = 1;

/// Beamline vacuum gauge infixes per linac segment.
pub const BEAMLINE_VACUUM_INFIXES: [&[&str]; 4] = [
    &["0198"],
    &["0202", "H292"],
    &["0402", "1592"],
    &["1602", "2594", "2598", "3592"],
];

/// Cryomodules carrying insulating vacuum gauges, per linac segment.
pub const INSULATING_VACUUM_CRYOMODULES: [&[&str]; 4] = [
    &["01"],
    &["02", "H1"],
    &["04", "06", "08", "10", "12", "14"],
    &["16", "18", "20", "22", "24", "27", "29", "31", "33", "34"],
];

/// Harmonic-linearizer cavity pairs sharing one SSA: (leader, follower).
pub const HL_SSA_SHARED_PAIRS: [(u8, u8); 4] = [(1, 5), (2, 6), (3, 7), (4, 8)];
