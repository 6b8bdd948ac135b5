use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::{
    error::{FetchError, truncate_body},
    model::{Coordinates, WeatherReading},
};

use super::{ProviderId, WeatherProvider};

const DEFAULT_BASE_URL: &str = "https://api.weatherapi.com";

/// WeatherAPI.com "current" endpoint. Reports wind already in km/h.
#[derive(Debug, Clone)]
pub struct WeatherApiProvider {
    api_key: Option<String>,
    lang: String,
    base_url: String,
    http: Client,
}

impl WeatherApiProvider {
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
struct WaCondition {
    text: String,
}

#[derive(Debug, Deserialize)]
struct WaCurrent {
    temp_c: f64,
    wind_kph: f64,
    gust_kph: Option<f64>,
    humidity: Option<f64>,
    pressure_mb: Option<f64>,
    condition: WaCondition,
    last_updated_epoch: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct WaResponse {
    current: WaCurrent,
}

fn parse_current(body: &str) -> Result<WeatherReading, FetchError> {
    let parsed: WaResponse = serde_json::from_str(body)
        .map_err(|e| FetchError::payload(ProviderId::WeatherApi, e.to_string()))?;
    let current = parsed.current;

    let observation_time = current
        .last_updated_epoch
        .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0))
        .unwrap_or_else(Utc::now);

    Ok(WeatherReading {
        temperature_c: current.temp_c,
        wind_speed_kph: current.wind_kph,
        wind_gust_kph: current.gust_kph.unwrap_or(current.wind_kph),
        humidity_pct: current.humidity,
        pressure_hpa: current.pressure_mb,
        condition: current.condition.text,
        observation_time,
    })
}

#[async_trait]
impl WeatherProvider for WeatherApiProvider {
    fn id(&self) -> ProviderId {
        ProviderId::WeatherApi
    }

    #[instrument(skip(self), fields(provider = "weatherapi"))]
    async fn fetch(&self, coordinates: Coordinates) -> Result<WeatherReading, FetchError> {
        let provider = self.id();
        let api_key = self.api_key.as_deref().ok_or(FetchError::MissingApiKey(provider))?;

        let url = format!("{}/v1/current.json", self.base_url);
        debug!(url = %url, "Fetching current conditions");

        let q = format!("{},{}", coordinates.latitude, coordinates.longitude);

        let res = self
            .http
            .get(&url)
            .query(&[("key", api_key), ("q", q.as_str()), ("lang", self.lang.as_str())])
            .send()
            .await
            .map_err(|source| FetchError::Transport { provider, source })?;

        let status = res.status();
        let body = res.text().await.map_err(|source| FetchError::Transport { provider, source })?;

        if !status.is_success() {
            warn!(status = %status, "WeatherAPI returned non-success status");
            return Err(FetchError::Status {
                provider,
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        parse_current(&body)
    }
}
