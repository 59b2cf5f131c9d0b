//! Centralized length-unit handling.
//!
//! Entity attributes carry implicit base units (volts, amperes, ohms, watts,
//! vars, meters, degrees), so most of the model is plain `f64`. Lengths are
//! the exception: vendor formats freely mix miles, kilofeet, and centimeters,
//! and the line-parameter engine computes in ohm/mile and feet. Every
//! conversion between those worlds goes through this module.
//!
//! Unknown unit tokens are a *soft* failure: conversion helpers return
//! `None` and the caller records a warning instead of aborting the run.

use serde::{Deserialize, Serialize};

/// Meters in one international foot.
pub const METERS_PER_FOOT: f64 = 0.3048;
/// Meters in one statute mile.
pub const METERS_PER_MILE: f64 = 1609.344;

/// The length units recognized uniformly across the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LengthUnit {
    /// Statute mile
    Mi,
    /// Kilometer
    Km,
    /// Kilofoot (1000 ft)
    Kft,
    /// Meter
    M,
    /// Foot
    Ft,
    /// Inch
    In,
    /// Centimeter
    Cm,
}

impl LengthUnit {
    /// Parse a unit token, case-insensitively. Returns `None` for unknown
    /// tokens so callers can degrade to a warning.
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "mi" => Some(LengthUnit::Mi),
            "km" => Some(LengthUnit::Km),
            "kft" => Some(LengthUnit::Kft),
            "m" => Some(LengthUnit::M),
            "ft" => Some(LengthUnit::Ft),
            "in" => Some(LengthUnit::In),
            "cm" => Some(LengthUnit::Cm),
            _ => None,
        }
    }

    /// Meters in one unit of this length.
    pub fn meters_per_unit(self) -> f64 {
        match self {
            LengthUnit::Mi => METERS_PER_MILE,
            LengthUnit::Km => 1000.0,
            LengthUnit::Kft => 1000.0 * METERS_PER_FOOT,
            LengthUnit::M => 1.0,
            LengthUnit::Ft => METERS_PER_FOOT,
            LengthUnit::In => METERS_PER_FOOT / 12.0,
            LengthUnit::Cm => 0.01,
        }
    }

    /// The canonical lowercase token for this unit.
    pub fn token(self) -> &'static str {
        match self {
            LengthUnit::Mi => "mi",
            LengthUnit::Km => "km",
            LengthUnit::Kft => "kft",
            LengthUnit::M => "m",
            LengthUnit::Ft => "ft",
            LengthUnit::In => "in",
            LengthUnit::Cm => "cm",
        }
    }
}

impl std::str::FromStr for LengthUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LengthUnit::from_token(s).ok_or_else(|| format!("unknown length unit '{s}'"))
    }
}

impl std::fmt::Display for LengthUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.token())
    }
}

/// Convert a value in `unit` to meters.
pub fn to_meters(value: f64, unit: LengthUnit) -> f64 {
    value * unit.meters_per_unit()
}

/// Convert a value in meters to `unit`.
pub fn from_meters(value: f64, unit: LengthUnit) -> f64 {
    value / unit.meters_per_unit()
}

/// Convert between two arbitrary length units.
pub fn convert(value: f64, from: LengthUnit, to: LengthUnit) -> f64 {
    value * from.meters_per_unit() / to.meters_per_unit()
}

/// Convert a raw unit token to meters. Returns `None` for unknown tokens.
pub fn token_to_meters(value: f64, token: &str) -> Option<f64> {
    LengthUnit::from_token(token).map(|unit| to_meters(value, unit))
}
