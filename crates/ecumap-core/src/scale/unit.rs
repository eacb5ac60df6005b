//! Engineering units attached to scales
//!
//! Provides the unit tag carried by every [`Scale`](super::Scale) plus
//! conversions between related units:
//! - Temperature: °C ↔ °F
//! - Pressure: kPa ↔ PSI ↔ bar
//! - Air-Fuel Ratio: Lambda ↔ AFR (gasoline stoichiometry, 14.7)
//! - Speed: km/h ↔ mph

use serde::{Deserialize, Serialize};
use std::fmt;

const KPA_PER_PSI: f64 = 6.894757293168361;
const KPA_PER_BAR: f64 = 100.0;
const MPH_PER_KMH: f64 = 0.62137119223733;
const STOICH_AFR_GASOLINE: f64 = 14.7;

/// Unit of an engineering value
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Unit {
    /// Dimensionless
    #[default]
    None,
    /// Revolutions per minute
    Rpm,
    /// Percent
    Percent,
    /// Degrees Celsius
    Celsius,
    /// Degrees Fahrenheit
    Fahrenheit,
    /// Kilopascal
    Kpa,
    /// Pounds per square inch
    Psi,
    /// Bar
    Bar,
    /// Volts
    Volts,
    /// Milliseconds
    Milliseconds,
    /// Crank angle degrees
    Degrees,
    /// Air-fuel equivalence ratio
    Lambda,
    /// Air-fuel ratio, gasoline stoichiometric at 14.7
    Afr,
    /// Kilometres per hour
    Kmh,
    /// Miles per hour
    Mph,
    /// Milligrams per stroke
    MgPerStroke,
    /// Free text unit not covered above
    Custom(String),
}

impl Unit {
    /// Display symbol
    pub fn symbol(&self) -> &str {
        match self {
            Unit::None => "",
            Unit::Rpm => "RPM",
            Unit::Percent => "%",
            Unit::Celsius => "°C",
            Unit::Fahrenheit => "°F",
            Unit::Kpa => "kPa",
            Unit::Psi => "psi",
            Unit::Bar => "bar",
            Unit::Volts => "V",
            Unit::Milliseconds => "ms",
            Unit::Degrees => "°",
            Unit::Lambda => "λ",
            Unit::Afr => "AFR",
            Unit::Kmh => "km/h",
            Unit::Mph => "mph",
            Unit::MgPerStroke => "mg/stroke",
            Unit::Custom(text) => text,
        }
    }

    /// Convert `value` expressed in this unit into `target`
    ///
    /// Returns `None` when the two units measure different quantities.
    pub fn convert(&self, value: f64, target: &Unit) -> Option<f64> {
        if self == target {
            return Some(value);
        }

        let converted = match (self, target) {
            (Unit::Celsius, Unit::Fahrenheit) => value * 9.0 / 5.0 + 32.0,
            (Unit::Fahrenheit, Unit::Celsius) => (value - 32.0) * 5.0 / 9.0,

            (Unit::Kpa, Unit::Psi) => value / KPA_PER_PSI,
            (Unit::Psi, Unit::Kpa) => value * KPA_PER_PSI,
            (Unit::Kpa, Unit::Bar) => value / KPA_PER_BAR,
            (Unit::Bar, Unit::Kpa) => value * KPA_PER_BAR,
            (Unit::Psi, Unit::Bar) => value * KPA_PER_PSI / KPA_PER_BAR,
            (Unit::Bar, Unit::Psi) => value * KPA_PER_BAR / KPA_PER_PSI,

            (Unit::Lambda, Unit::Afr) => value * STOICH_AFR_GASOLINE,
            (Unit::Afr, Unit::Lambda) => value / STOICH_AFR_GASOLINE,

            (Unit::Kmh, Unit::Mph) => value * MPH_PER_KMH,
            (Unit::Mph, Unit::Kmh) => value / MPH_PER_KMH,

            _ => return None,
        };
        Some(converted)
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}
