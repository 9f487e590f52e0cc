//! Closed table of physical-unit spellings recognised after numeric literals.
//!
//! The table is used for lexical recognition only. No conversion or
//! dimensional checking happens here; a unit tag is just the spelling plus
//! the quantity kind it belongs to.
//!
//! Every spelling is reserved: the lexer emits a unit token for it wherever
//! it appears, so `s`, `m`, `A` or `T` can't name a variable or an activity
//! (they are still allowed after `.` and as struct field names). Compound
//! spellings are matched only without spaces: `L/min` is one unit, while
//! `L / min` is a division of two identifiers.

use serde::Serialize;
use std::fmt;

/// Physical quantity a unit spelling measures.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum QuantityKind {
    Temperature,
    Angular,
    Length,
    Time,
    Electrical,
    Frequency,
    Pressure,
    Mass,
    Force,
    Energy,
    Velocity,
    Acceleration,
    MagneticFlux,
    VolumetricFlow,
    DimensionlessRatio,
    DataVolume,
    Concentration,
    Radiation,
}

impl QuantityKind {
    pub const ALL: [QuantityKind; 18] = [
        QuantityKind::Temperature,
        QuantityKind::Angular,
        QuantityKind::Length,
        QuantityKind::Time,
        QuantityKind::Electrical,
        QuantityKind::Frequency,
        QuantityKind::Pressure,
        QuantityKind::Mass,
        QuantityKind::Force,
        QuantityKind::Energy,
        QuantityKind::Velocity,
        QuantityKind::Acceleration,
        QuantityKind::MagneticFlux,
        QuantityKind::VolumetricFlow,
        QuantityKind::DimensionlessRatio,
        QuantityKind::DataVolume,
        QuantityKind::Concentration,
        QuantityKind::Radiation,
    ];

    pub fn name(self) -> &'static str {
        match self {
            QuantityKind::Temperature => "temperature",
            QuantityKind::Angular => "angular",
            QuantityKind::Length => "length",
            QuantityKind::Time => "time",
            QuantityKind::Electrical => "electrical",
            QuantityKind::Frequency => "frequency",
            QuantityKind::Pressure => "pressure",
            QuantityKind::Mass => "mass",
            QuantityKind::Force => "force",
            QuantityKind::Energy => "energy",
            QuantityKind::Velocity => "velocity",
            QuantityKind::Acceleration => "acceleration",
            QuantityKind::MagneticFlux => "magnetic_flux",
            QuantityKind::VolumetricFlow => "volumetric_flow",
            QuantityKind::DimensionlessRatio => "dimensionless_ratio",
            QuantityKind::DataVolume => "data_volume",
            QuantityKind::Concentration => "concentration",
            QuantityKind::Radiation => "radiation",
        }
    }
}

impl fmt::Display for QuantityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

use QuantityKind::*;

/// Every recognised spelling. Spellings are case-sensitive.
pub static UNITS: &[(&str, QuantityKind)] = &[
    // temperature
    ("degC", Temperature),
    ("degF", Temperature),
    ("K", Temperature),
    ("mK", Temperature),
    // angular
    ("deg", Angular),
    ("rad", Angular),
    ("mrad", Angular),
    ("urad", Angular),
    ("arcmin", Angular),
    ("arcsec", Angular),
    ("deg/s", Angular),
    ("rad/s", Angular),
    ("deg/s2", Angular),
    ("rad/s2", Angular),
    // length
    ("m", Length),
    ("km", Length),
    ("cm", Length),
    ("mm", Length),
    ("um", Length),
    ("nm", Length),
    // time
    ("s", Time),
    ("ms", Time),
    ("us", Time),
    ("ns", Time),
    ("h", Time),
    ("day", Time),
    // electrical
    ("V", Electrical),
    ("mV", Electrical),
    ("kV", Electrical),
    ("A", Electrical),
    ("mA", Electrical),
    ("uA", Electrical),
    ("W", Electrical),
    ("mW", Electrical),
    ("kW", Electrical),
    ("Ohm", Electrical),
    ("kOhm", Electrical),
    ("MOhm", Electrical),
    ("uF", Electrical),
    ("nF", Electrical),
    ("Ah", Electrical),
    ("mAh", Electrical),
    // frequency
    ("Hz", Frequency),
    ("kHz", Frequency),
    ("MHz", Frequency),
    ("GHz", Frequency),
    ("rpm", Frequency),
    // pressure
    ("Pa", Pressure),
    ("hPa", Pressure),
    ("kPa", Pressure),
    ("MPa", Pressure),
    ("bar", Pressure),
    ("mbar", Pressure),
    ("psi", Pressure),
    ("Torr", Pressure),
    // mass
    ("kg", Mass),
    ("g", Mass),
    ("mg", Mass),
    // force
    ("N", Force),
    ("mN", Force),
    ("kN", Force),
    ("Nm", Force),
    // energy
    ("J", Energy),
    ("kJ", Energy),
    ("Wh", Energy),
    ("kWh", Energy),
    ("eV", Energy),
    // velocity
    ("m/s", Velocity),
    ("km/s", Velocity),
    ("km/h", Velocity),
    // acceleration
    ("m/s2", Acceleration),
    ("mm/s2", Acceleration),
    // magnetic flux
    ("T", MagneticFlux),
    ("mT", MagneticFlux),
    ("uT", MagneticFlux),
    ("nT", MagneticFlux),
    ("Wb", MagneticFlux),
    // volumetric flow
    ("L/s", VolumetricFlow),
    ("L/min", VolumetricFlow),
    ("m3/s", VolumetricFlow),
    ("sccm", VolumetricFlow),
    // dimensionless ratio
    ("%", DimensionlessRatio),
    ("ppm", DimensionlessRatio),
    ("dB", DimensionlessRatio),
    // data volume
    ("bit", DataVolume),
    ("kbit", DataVolume),
    ("Mbit", DataVolume),
    ("B", DataVolume),
    ("kB", DataVolume),
    ("MB", DataVolume),
    ("GB", DataVolume),
    ("bps", DataVolume),
    ("kbps", DataVolume),
    ("Mbps", DataVolume),
    // concentration
    ("mol/L", Concentration),
    ("mmol/L", Concentration),
    ("mg/L", Concentration),
    ("ppb", Concentration),
    // radiation
    ("Gy", Radiation),
    ("mGy", Radiation),
    ("krad", Radiation),
    ("Sv", Radiation),
    ("mSv", Radiation),
    ("W/m2", Radiation),
];

/// Quantity kind for an exact spelling, if it is a unit.
pub fn lookup(spelling: &str) -> Option<QuantityKind> {
    UNITS
        .iter()
        .find(|(s, _)| *s == spelling)
        .map(|(_, kind)| *kind)
}

pub fn is_unit(spelling: &str) -> bool {
    lookup(spelling).is_some()
}

/// Longest unit spelling that is a prefix of `candidate` and ends on a
/// word boundary (the following character, if any, is not `[A-Za-z0-9_]`).
/// Returns the length in bytes.
pub fn longest_match(candidate: &str) -> Option<usize> {
    UNITS
        .iter()
        .map(|(s, _)| *s)
        .filter(|s| candidate.starts_with(s))
        .filter(|s| {
            candidate[s.len()..]
                .chars()
                .next()
                .map_or(true, |c| !(c.is_ascii_alphanumeric() || c == '_'))
        })
        .map(str::len)
        .max()
}

/// Units grouped by kind, in table order, for listings.
pub fn by_kind(kind: QuantityKind) -> impl Iterator<Item = &'static str> {
    UNITS
        .iter()
        .filter(move |(_, k)| *k == kind)
        .map(|(s, _)| *s)
}
