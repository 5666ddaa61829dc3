//! Unit systems, display units and locale-specific alert thresholds.

use std::fmt;
use std::str::FromStr;

use crate::Threshold;

/// Unit systems understood by the weather API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum UnitSystem {
    /// Fahrenheit, inches, miles per hour.
    #[default]
    Imperial,
    /// Celsius, millimetres, kilometres per hour.
    Metric,
    /// Celsius and millimetres, but miles per hour.
    UkHybrid,
    /// Celsius, millimetres, metres per second.
    MetricSi,
}

impl UnitSystem {
    /// Every supported unit system.
    pub const ALL: [UnitSystem; 4] = [
        UnitSystem::Imperial,
        UnitSystem::Metric,
        UnitSystem::UkHybrid,
        UnitSystem::MetricSi,
    ];

    /// Canonical configuration name.
    pub const fn name(&self) -> &'static str {
        match self {
            UnitSystem::Imperial => "imperial",
            UnitSystem::Metric => "metric",
            UnitSystem::UkHybrid => "uk_hybrid",
            UnitSystem::MetricSi => "metric_si",
        }
    }

    /// Value of the `units` query parameter.
    pub const fn query_code(&self) -> &'static str {
        match self {
            UnitSystem::Imperial => "e",
            UnitSystem::Metric => "m",
            UnitSystem::UkHybrid => "h",
            UnitSystem::MetricSi => "s",
        }
    }

    /// Name of the sub-object carrying unit-dependent fields in a response.
    ///
    /// This happens to equal [`UnitSystem::name`] for every system.
    pub const fn response_key(&self) -> &'static str {
        self.name()
    }

    /// True when temperatures are reported in Fahrenheit.
    pub const fn is_fahrenheit(&self) -> bool {
        matches!(self, UnitSystem::Imperial)
    }
}

impl fmt::Display for UnitSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for UnitSystem {
    type Err = UnknownUnitSystem;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "imperial" | "english" | "e" => Ok(UnitSystem::Imperial),
            "metric" | "m" => Ok(UnitSystem::Metric),
            "uk_hybrid" | "uk-hybrid" | "hybrid" | "h" => Ok(UnitSystem::UkHybrid),
            "metric_si" | "metric-si" | "si" | "s" => Ok(UnitSystem::MetricSi),
            _ => Err(UnknownUnitSystem(s.to_string())),
        }
    }
}

/// A configured unit system name that matches none of [`UnitSystem::ALL`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownUnitSystem(pub String);

impl fmt::Display for UnknownUnitSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown unit system '{}' (expected imperial, metric, uk_hybrid or metric_si)",
            self.0
        )
    }
}

impl std::error::Error for UnknownUnitSystem {}

/// Physical quantities whose display unit depends on the unit system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Quantity {
    Distance,
    Pressure,
    Precipitation,
    /// Precipitation per hour.
    PrecipitationRate,
    Speed,
    Temperature,
}

/// Wind-chill alert levels.
///
/// Colder is worse, so `danger` is numerically below `caution`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindChillThresholds {
    pub caution: f64,
    pub danger: f64,
}

/// The four heat-index advisory tiers, ascending.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeatIndexThresholds {
    pub caution: f64,
    pub extreme_caution: f64,
    pub danger: f64,
    pub extreme_danger: f64,
}

/// Display units and alert thresholds for one unit system.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitTable {
    pub system: UnitSystem,
    pub distance: &'static str,
    pub pressure: &'static str,
    pub precipitation: &'static str,
    pub speed: &'static str,
    pub temperature: &'static str,
    pub wind_chill: WindChillThresholds,
    pub heat_index: HeatIndexThresholds,
}

const FAHRENHEIT_WIND_CHILL: WindChillThresholds = WindChillThresholds {
    caution: -18.0,
    danger: -35.0,
};

const CELSIUS_WIND_CHILL: WindChillThresholds = WindChillThresholds {
    caution: -28.0,
    danger: -37.0,
};

const FAHRENHEIT_HEAT_INDEX: HeatIndexThresholds = HeatIndexThresholds {
    caution: 80.0,
    extreme_caution: 90.0,
    danger: 103.0,
    extreme_danger: 125.0,
};

const CELSIUS_HEAT_INDEX: HeatIndexThresholds = HeatIndexThresholds {
    caution: 27.0,
    extreme_caution: 32.0,
    danger: 39.0,
    extreme_danger: 52.0,
};

impl UnitTable {
    /// Resolve the table for a unit system. Total over [`UnitSystem`].
    pub fn for_system(system: UnitSystem) -> Self {
        let (distance, pressure, precipitation, speed) = match system {
            UnitSystem::Imperial => ("ft", "inHg", "in", "mph"),
            UnitSystem::Metric => ("m", "mb", "mm", "km/h"),
            UnitSystem::UkHybrid => ("ft", "mb", "mm", "mph"),
            UnitSystem::MetricSi => ("m", "hPa", "mm", "m/s"),
        };
        let (temperature, wind_chill, heat_index) = if system.is_fahrenheit() {
            ("°F", FAHRENHEIT_WIND_CHILL, FAHRENHEIT_HEAT_INDEX)
        } else {
            ("°C", CELSIUS_WIND_CHILL, CELSIUS_HEAT_INDEX)
        };

        Self {
            system,
            distance,
            pressure,
            precipitation,
            speed,
            temperature,
            wind_chill,
            heat_index,
        }
    }

    /// Display unit for a quantity.
    pub fn unit(&self, quantity: Quantity) -> String {
        match quantity {
            Quantity::Distance => self.distance.to_string(),
            Quantity::Pressure => self.pressure.to_string(),
            Quantity::Precipitation => self.precipitation.to_string(),
            Quantity::PrecipitationRate => format!("{}/hr", self.precipitation),
            Quantity::Speed => self.speed.to_string(),
            Quantity::Temperature => self.temperature.to_string(),
        }
    }

    /// Wind-chill `(warning, critical)` pair: alert when the value falls
    /// below caution, then below danger.
    pub fn wind_chill_alert(&self) -> (Threshold, Threshold) {
        (
            Threshold::at_least(self.wind_chill.caution),
            Threshold::at_least(self.wind_chill.danger),
        )
    }

    /// Heat-index `(warning, critical)` pair: warn above extreme caution,
    /// critical above danger.
    pub fn heat_index_alert(&self) -> (Threshold, Threshold) {
        (
            Threshold::at_most(self.heat_index.extreme_caution),
            Threshold::at_most(self.heat_index.danger),
        )
    }
}

impl Default for UnitTable {
    fn default() -> Self {
        Self::for_system(UnitSystem::default())
    }
}

/// Resolve a configured unit-system name into its unit table.
///
/// Fails on names outside the enumerated systems. Callers for which units
/// are not critical should fall back to [`UnitTable::default`].
pub fn resolve(unit_system: &str) -> Result<UnitTable, UnknownUnitSystem> {
    unit_system.parse().map(UnitTable::for_system)
}
