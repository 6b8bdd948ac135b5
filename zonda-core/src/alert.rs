//! Alert tier classification.
//!
//! Two threshold schemes are supported. [`AlertPolicy::Zonda`] is the
//! canonical four-tier scheme; [`AlertPolicy::Legacy`] only flags strong
//! gusts and never produces [`AlertTier::Severe`] or [`AlertTier::StormWatch`].

use serde::{Deserialize, Deserializer, Serialize};

use crate::model::{AlertTier, Report, WeatherReading};

pub const SEVERE_ADVISORY: &str = "🔥 PROHIBIDO encender fuego al aire libre. \
Asegurar techos, chapas y objetos sueltos. \
Peligro de caída de árboles y cables: no transitar debajo de ellos.";

pub const STORM_ADVISORY: &str = "⛈️ No cruzar badenes ni arroyos crecidos. \
Riesgo de tormenta eléctrica: evitar zonas altas y descampadas.";

pub const CAUTION_ADVISORY: &str = "🚗 Reducir la velocidad al conducir. \
Ráfagas fuertes en el corredor de la Ruta 7 y el Dique.";

pub const NORMAL_ADVISORY: &str = "✅ Condiciones estables. \
Llevar agua y abrigo si salís a la montaña.";

pub const LEGACY_STRONG_WIND_ADVISORY: &str = "SÍ - VIENTO FUERTE / POSIBLE ZONDA. \
Asegurar objetos sueltos y evitar fuego.";

pub const LEGACY_CALM_ADVISORY: &str = "NO. Sin alertas de viento activas.";

fn default_storm_keywords() -> Vec<String> {
    [
        "lluvia",
        "llovizna",
        "chubasco",
        "tormenta",
        "nieve",
        "rain",
        "drizzle",
        "shower",
        "storm",
        "snow",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// Thresholds of the four-tier zonda scheme. All comparisons are strict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZondaThresholds {
    pub severe_gust_kph: f64,
    pub severe_humidity_pct: f64,
    pub caution_gust_kph: f64,
    /// Matched case-insensitively as substrings of the condition text.
    pub storm_keywords: Vec<String>,
}

impl Default for ZondaThresholds {
    fn default() -> Self {
        Self {
            severe_gust_kph: 55.0,
            severe_humidity_pct: 25.0,
            caution_gust_kph: 40.0,
            storm_keywords: default_storm_keywords(),
        }
    }
}

/// Single-threshold scheme: gusts above `strong_gust_kph` raise a caution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LegacyThresholds {
    pub strong_gust_kph: f64,
}

impl Default for LegacyThresholds {
    fn default() -> Self {
        Self { strong_gust_kph: 50.0 }
    }
}

/// Serialized as a flat table with a `policy` tag. When reading, a missing
/// tag means `zonda`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "policy", rename_all = "lowercase")]
pub enum AlertPolicy {
    Zonda(ZondaThresholds),
    Legacy(LegacyThresholds),
}

impl Default for AlertPolicy {
    fn default() -> Self {
        AlertPolicy::Zonda(ZondaThresholds::default())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
enum PolicyKind {
    #[default]
    Zonda,
    Legacy,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawPolicy {
    #[serde(default)]
    policy: PolicyKind,
    severe_gust_kph: Option<f64>,
    severe_humidity_pct: Option<f64>,
    caution_gust_kph: Option<f64>,
    storm_keywords: Option<Vec<String>>,
    strong_gust_kph: Option<f64>,
}

impl From<RawPolicy> for AlertPolicy {
    fn from(raw: RawPolicy) -> Self {
        match raw.policy {
            PolicyKind::Zonda => {
                let d = ZondaThresholds::default();
                AlertPolicy::Zonda(ZondaThresholds {
                    severe_gust_kph: raw.severe_gust_kph.unwrap_or(d.severe_gust_kph),
                    severe_humidity_pct: raw.severe_humidity_pct.unwrap_or(d.severe_humidity_pct),
                    caution_gust_kph: raw.caution_gust_kph.unwrap_or(d.caution_gust_kph),
                    storm_keywords: raw.storm_keywords.unwrap_or(d.storm_keywords),
                })
            }
            PolicyKind::Legacy => {
                let d = LegacyThresholds::default();
                AlertPolicy::Legacy(LegacyThresholds {
                    strong_gust_kph: raw.strong_gust_kph.unwrap_or(d.strong_gust_kph),
                })
            }
        }
    }
}

impl<'de> Deserialize<'de> for AlertPolicy {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        RawPolicy::deserialize(deserializer).map(AlertPolicy::from)
    }
}

impl AlertPolicy {
    pub fn zonda() -> Self {
        AlertPolicy::Zonda(ZondaThresholds::default())
    }

    pub fn legacy() -> Self {
        AlertPolicy::Legacy(LegacyThresholds::default())
    }

    pub fn name(&self) -> &'static str {
        match self {
            AlertPolicy::Zonda(_) => "zonda",
            AlertPolicy::Legacy(_) => "legacy",
        }
    }

    /// Resolve the tier for a reading. First matching rule wins.
    pub fn tier(&self, reading: &WeatherReading) -> AlertTier {
        match self {
            AlertPolicy::Zonda(t) => zonda_tier(t, reading),
            AlertPolicy::Legacy(t) => {
                if reading.wind_gust_kph > t.strong_gust_kph {
                    AlertTier::Caution
                } else {
                    AlertTier::Normal
                }
            }
        }
    }

    fn advisory(&self, tier: AlertTier) -> &'static str {
        match (self, tier) {
            (AlertPolicy::Legacy(_), AlertTier::Normal) => LEGACY_CALM_ADVISORY,
            (AlertPolicy::Legacy(_), _) => LEGACY_STRONG_WIND_ADVISORY,
            (AlertPolicy::Zonda(_), AlertTier::Severe) => SEVERE_ADVISORY,
            (AlertPolicy::Zonda(_), AlertTier::StormWatch) => STORM_ADVISORY,
            (AlertPolicy::Zonda(_), AlertTier::Caution) => CAUTION_ADVISORY,
            (AlertPolicy::Zonda(_), AlertTier::Normal) => NORMAL_ADVISORY,
        }
    }

    /// Classify a reading into a [`Report`]. Pure: same input, same output.
    pub fn classify(&self, reading: WeatherReading) -> Report {
        let tier = self.tier(&reading);
        Report { tier, advisory: self.advisory(tier).to_string(), reading }
    }
}

fn zonda_tier(t: &ZondaThresholds, reading: &WeatherReading) -> AlertTier {
    // Unknown humidity never qualifies as the dry zonda pattern.
    let dry = reading.humidity_pct.is_some_and(|h| h < t.severe_humidity_pct);
    if reading.wind_gust_kph > t.severe_gust_kph && dry {
        return AlertTier::Severe;
    }

    let condition = reading.condition.to_lowercase();
    if t.storm_keywords.iter().any(|k| condition.contains(&k.to_lowercase())) {
        return AlertTier::StormWatch;
    }

    if reading.wind_gust_kph > t.caution_gust_kph {
        return AlertTier::Caution;
    }

    AlertTier::Normal
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn reading(gust: f64, humidity: Option<f64>, condition: &str) -> WeatherReading {
        WeatherReading {
            temperature_c: 18.0,
            wind_speed_kph: 20.0,
            wind_gust_kph: gust,
            humidity_pct: humidity,
            pressure_hpa: Some(1012.0),
            condition: condition.to_string(),
            observation_time: Utc::now(),
        }
    }

    #[test]
    fn dry_high_gusts_are_severe() {
        let report = AlertPolicy::zonda().classify(reading(60.0, Some(20.0), "despejado"));

        assert_eq!(report.tier, AlertTier::Severe);
        assert!(report.advisory.contains("PROHIBIDO encender fuego"));
    }

    #[test]
    fn severe_wins_over_storm_keywords() {
        let tier = AlertPolicy::zonda().tier(&reading(70.0, Some(10.0), "tormenta de polvo"));
        assert_eq!(tier, AlertTier::Severe);
    }

    #[test]
    fn high_gusts_with_humid_air_are_not_severe() {
        let tier = AlertPolicy::zonda().tier(&reading(60.0, Some(60.0), "nubes dispersas"));
        assert_eq!(tier, AlertTier::Caution);
    }

    #[test]
    fn missing_humidity_is_not_severe() {
        let tier = AlertPolicy::zonda().tier(&reading(80.0, None, "cielo claro"));
        assert_eq!(tier, AlertTier::Caution);
    }

    #[test]
    fn storm_keywords_match_case_insensitively() {
        let policy = AlertPolicy::zonda();
        for condition in ["Lluvia ligera", "TORMENTA", "light rain", "Thunderstorm", "llovizna"] {
            let report = policy.classify(reading(10.0, Some(80.0), condition));
            assert_eq!(report.tier, AlertTier::StormWatch, "condition: {condition}");
            assert!(report.advisory.contains("badenes"));
        }
    }

    #[test]
    fn storm_wins_over_caution() {
        let tier = AlertPolicy::zonda().tier(&reading(50.0, Some(80.0), "lluvia moderada"));
        assert_eq!(tier, AlertTier::StormWatch);
    }

    #[test]
    fn caution_band_is_above_40_up_to_55() {
        let policy = AlertPolicy::zonda();
        assert_eq!(policy.tier(&reading(40.0, Some(50.0), "despejado")), AlertTier::Normal);
        assert_eq!(policy.tier(&reading(40.1, Some(50.0), "despejado")), AlertTier::Caution);
        assert_eq!(policy.tier(&reading(55.0, Some(10.0), "despejado")), AlertTier::Caution);
        assert_eq!(policy.tier(&reading(55.1, Some(10.0), "despejado")), AlertTier::Severe);
    }

    #[test]
    fn severe_humidity_threshold_is_strict() {
        let tier = AlertPolicy::zonda().tier(&reading(60.0, Some(25.0), "despejado"));
        assert_eq!(tier, AlertTier::Caution);
    }

    #[test]
    fn calm_conditions_are_normal() {
        let report = AlertPolicy::zonda().classify(reading(15.0, Some(40.0), "cielo claro"));
        assert_eq!(report.tier, AlertTier::Normal);
        assert!(report.advisory.contains("agua y abrigo"));
    }

    #[test]
    fn classify_is_deterministic() {
        let policy = AlertPolicy::zonda();
        let input = reading(45.0, Some(30.0), "nubes");

        let a = policy.classify(input.clone());
        let b = policy.classify(input);
        assert_eq!(a, b);
    }

    #[test]
    fn custom_keywords_replace_defaults() {
        let policy = AlertPolicy::Zonda(ZondaThresholds {
            storm_keywords: vec!["granizo".into()],
            ..Default::default()
        });
        assert_eq!(policy.tier(&reading(10.0, Some(50.0), "lluvia")), AlertTier::Normal);
        assert_eq!(policy.tier(&reading(10.0, Some(50.0), "Granizo")), AlertTier::StormWatch);
    }

    #[test]
    fn legacy_policy_only_flags_strong_gusts() {
        let policy = AlertPolicy::legacy();

        let calm = policy.classify(reading(50.0, Some(10.0), "tormenta"));
        assert_eq!(calm.tier, AlertTier::Normal);
        assert_eq!(calm.advisory, LEGACY_CALM_ADVISORY);

        let windy = policy.classify(reading(50.5, Some(90.0), "despejado"));
        assert_eq!(windy.tier, AlertTier::Caution);
        assert!(windy.advisory.contains("VIENTO FUERTE"));
    }

    #[test]
    fn policy_deserializes_with_partial_thresholds() {
        let policy: AlertPolicy =
            toml::from_str("policy = \"zonda\"\ncaution_gust_kph = 35.0\n").expect("valid toml");

        match policy {
            AlertPolicy::Zonda(t) => {
                assert_eq!(t.caution_gust_kph, 35.0);
                assert_eq!(t.severe_gust_kph, 55.0);
                assert!(t.storm_keywords.iter().any(|k| k == "tormenta"));
            }
            other => panic!("expected zonda policy, got {other:?}"),
        }
    }

    #[test]
    fn policy_tag_defaults_to_zonda() {
        let policy: AlertPolicy = toml::from_str("caution_gust_kph = 35.0\n").expect("valid toml");

        match policy {
            AlertPolicy::Zonda(t) => assert_eq!(t.caution_gust_kph, 35.0),
            other => panic!("expected zonda policy, got {other:?}"),
        }
    }

    #[test]
    fn unknown_policy_or_field_is_rejected() {
        assert!(toml::from_str::<AlertPolicy>("policy = \"extreme\"\n").is_err());
        assert!(toml::from_str::<AlertPolicy>("caution_gust = 35.0\n").is_err());
    }

    #[test]
    fn policy_survives_toml_roundtrip() {
        for policy in [AlertPolicy::zonda(), AlertPolicy::legacy()] {
            let text = toml::to_string(&policy).expect("serializable");
            let back: AlertPolicy = toml::from_str(&text).expect("parseable");
            assert_eq!(back, policy);
        }
    }
}
