use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Meters per second to kilometers per hour.
pub const MPS_TO_KPH: f64 = 3.6;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

/// Current conditions at the monitored location, normalized to metric units.
///
/// Speeds are always km/h regardless of what the provider reports. When the
/// provider has no gust data, `wind_gust_kph` holds the sustained speed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReading {
    pub temperature_c: f64,
    pub wind_speed_kph: f64,
    pub wind_gust_kph: f64,
    pub humidity_pct: Option<f64>,
    pub pressure_hpa: Option<f64>,
    pub condition: String,
    pub observation_time: DateTime<Utc>,
}

/// Alert classification of a reading, lowest to highest priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlertTier {
    Normal,
    Caution,
    StormWatch,
    Severe,
}

impl AlertTier {
    /// Label shown to users in the rendered report.
    pub fn label(&self) -> &'static str {
        match self {
            AlertTier::Normal => "NORMAL",
            AlertTier::Caution => "PRECAUCIÓN - VIENTO FUERTE",
            AlertTier::StormWatch => "VIGILANCIA - TORMENTA",
            AlertTier::Severe => "ALERTA ZONDA",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            AlertTier::Normal => "🟢",
            AlertTier::Caution => "🟡",
            AlertTier::StormWatch => "🟠",
            AlertTier::Severe => "🔴",
        }
    }
}

impl std::fmt::Display for AlertTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Outcome of classifying one reading. Lives for a single request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub tier: AlertTier,
    pub advisory: String,
    pub reading: WeatherReading,
}
