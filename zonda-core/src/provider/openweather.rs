use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::{
    error::{FetchError, truncate_body},
    model::{Coordinates, MPS_TO_KPH, WeatherReading},
};

use super::{ProviderId, WeatherProvider};

const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";

/// OpenWeather "current weather" endpoint. Reports wind in m/s.
#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: Option<String>,
    lang: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: Option<String>, lang: &str) -> Self {
        Self::with_base_url(api_key, lang, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(api_key: Option<String>, lang: &str, base_url: &str) -> Self {
        Self {
            api_key,
            lang: lang.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    humidity: Option<f64>,
    pressure: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
    gust: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    dt: Option<i64>,
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
}

/// OpenWeather echoes a `cod` field that is 200 on success. Error bodies carry
/// it as a string, so both forms are accepted.
fn cod_is_ok(cod: &Value) -> bool {
    match cod {
        Value::Number(n) => n.as_u64() == Some(200),
        Value::String(s) => s == "200",
        _ => false,
    }
}

fn parse_current(body: &str) -> Result<WeatherReading, FetchError> {
    let provider = ProviderId::OpenWeather;

    let value: Value = serde_json::from_str(body)
        .map_err(|e| FetchError::payload(provider, format!("invalid JSON: {e}")))?;

    if let Some(cod) = value.get("cod").filter(|c| !cod_is_ok(c)) {
        let status = match cod {
            Value::Number(n) => n.as_u64().and_then(|n| u16::try_from(n).ok()),
            Value::String(s) => s.parse().ok(),
            _ => None,
        };
        let message = value.get("message").and_then(Value::as_str).unwrap_or_default();
        return Err(FetchError::Status {
            provider,
            status: status.unwrap_or(0),
            body: truncate_body(message),
        });
    }

    let parsed: OwCurrentResponse = serde_json::from_value(value)
        .map_err(|e| FetchError::payload(provider, e.to_string()))?;

    let condition = parsed
        .weather
        .into_iter()
        .next()
        .map(|w| w.description)
        .ok_or_else(|| FetchError::payload(provider, "no condition description"))?;

    let wind_speed_kph = parsed.wind.speed * MPS_TO_KPH;
    let wind_gust_kph = parsed.wind.gust.unwrap_or(parsed.wind.speed) * MPS_TO_KPH;

    let observation_time = parsed
        .dt
        .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0))
        .unwrap_or_else(Utc::now);

    Ok(WeatherReading {
        temperature_c: parsed.main.temp,
        wind_speed_kph,
        wind_gust_kph,
        humidity_pct: parsed.main.humidity,
        pressure_hpa: parsed.main.pressure,
        condition,
        observation_time,
    })
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    fn id(&self) -> ProviderId {
        ProviderId::OpenWeather
    }

    #[instrument(skip(self), fields(provider = "openweather"))]
    async fn fetch(&self, coordinates: Coordinates) -> Result<WeatherReading, FetchError> {
        let provider = self.id();
        let api_key = self.api_key.as_deref().ok_or(FetchError::MissingApiKey(provider))?;

        let url = format!("{}/data/2.5/weather", self.base_url);
        debug!(url = %url, "Fetching current conditions");

        let lat = coordinates.latitude.to_string();
        let lon = coordinates.longitude.to_string();

        let res = self
            .http
            .get(&url)
            .query(&[
                ("lat", lat.as_str()),
                ("lon", lon.as_str()),
                ("appid", api_key),
                ("units", "metric"),
                ("lang", self.lang.as_str()),
            ])
            .send()
            .await
            .map_err(|source| FetchError::Transport { provider, source })?;

        let status = res.status();
        let body = res.text().await.map_err(|source| FetchError::Transport { provider, source })?;

        if !status.is_success() {
            warn!(status = %status, "OpenWeather returned non-success status");
            return Err(FetchError::Status {
                provider,
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        parse_current(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_wind_to_kph() {
        let reading = parse_current(
            r#"{"cod":200,"dt":1700000000,"main":{"temp":12.3,"humidity":30,"pressure":1015},
                "wind":{"speed":10.0,"gust":15.0},"weather":[{"description":"cielo claro"}]}"#,
        )
        .expect("valid payload");

        assert!((reading.wind_speed_kph - 36.0).abs() < 0.01);
        assert!((reading.wind_gust_kph - 54.0).abs() < 0.01);
        assert_eq!(reading.humidity_pct, Some(30.0));
        assert_eq!(reading.pressure_hpa, Some(1015.0));
        assert_eq!(reading.condition, "cielo claro");
        assert_eq!(reading.observation_time.timestamp(), 1_700_000_000);
    }

    #[test]
    fn gust_falls_back_to_wind_speed() {
        let reading = parse_current(
            r#"{"main":{"temp":5.0},"wind":{"speed":5.0},"weather":[{"description":"nubes"}]}"#,
        )
        .expect("valid payload");

        assert!((reading.wind_gust_kph - 18.0).abs() < 0.01);
        assert_eq!(reading.wind_gust_kph, reading.wind_speed_kph);
        assert_eq!(reading.humidity_pct, None);
    }

    #[test]
    fn error_cod_is_a_status_failure() {
        let err = parse_current(r#"{"cod":"401","message":"Invalid API key"}"#).unwrap_err();
        match err {
            FetchError::Status { status, body, .. } => {
                assert_eq!(status, 401);
                assert_eq!(body, "Invalid API key");
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[test]
    fn missing_required_fields_are_payload_errors() {
        let no_temp = r#"{"main":{},"wind":{"speed":1.0},"weather":[{"description":"x"}]}"#;
        let no_wind = r#"{"main":{"temp":1.0},"weather":[{"description":"x"}]}"#;
        let no_desc = r#"{"main":{"temp":1.0},"wind":{"speed":1.0},"weather":[]}"#;

        for body in [no_temp, no_wind, no_desc, "not json"] {
            let err = parse_current(body).unwrap_err();
            assert!(matches!(err, FetchError::Payload { .. }), "body {body}: {err:?}");
        }
    }
}
