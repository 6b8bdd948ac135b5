use crate::{
    Config, FetchError,
    model::{Coordinates, WeatherReading},
    provider::{openweather::OpenWeatherProvider, weatherapi::WeatherApiProvider},
};
use async_trait::async_trait;
use std::{convert::TryFrom, fmt::Debug};
use tracing::warn;

pub mod openweather;
pub mod weatherapi;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    OpenWeather,
    WeatherApi,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::OpenWeather => "openweather",
            ProviderId::WeatherApi => "weatherapi",
        }
    }

    /// Environment variable that may carry this provider's API key.
    pub fn env_var(&self) -> &'static str {
        match self {
            ProviderId::OpenWeather => "OPENWEATHER_API_KEY",
            ProviderId::WeatherApi => "WEATHERAPI_API_KEY",
        }
    }

    pub const fn all() -> &'static [ProviderId] {
        &[ProviderId::OpenWeather, ProviderId::WeatherApi]
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ProviderId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "openweather" => Ok(ProviderId::OpenWeather),
            "weatherapi" => Ok(ProviderId::WeatherApi),
            _ => Err(anyhow::anyhow!(
                "Unknown provider '{value}'. Supported providers: openweather, weatherapi."
            )),
        }
    }
}

/// Source of current conditions for a fixed point.
///
/// Implementations issue exactly one request per call, with no retries and
/// no caching, and report every failure as a [`FetchError`].
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    fn id(&self) -> ProviderId;

    async fn fetch(&self, coordinates: Coordinates) -> Result<WeatherReading, FetchError>;
}

/// Construct a provider from config and explicit ProviderId.
///
/// A missing API key is not an error here: the provider is still built and
/// every fetch reports [`FetchError::MissingApiKey`].
pub fn provider_from_config(id: ProviderId, config: &Config) -> Box<dyn WeatherProvider> {
    let api_key = config.provider_api_key(id).map(str::to_owned);
    if api_key.is_none() {
        warn!(
            provider = %id,
            "No API key configured; run `zonda-bot configure {id}` or set {}",
            id.env_var()
        );
    }

    match id {
        ProviderId::OpenWeather => Box::new(OpenWeatherProvider::new(api_key, &config.lang)),
        ProviderId::WeatherApi => Box::new(WeatherApiProvider::new(api_key, &config.lang)),
    }
}

/// Construct the default provider from config, using `default_provider` field.
pub fn default_provider_from_config(config: &Config) -> anyhow::Result<Box<dyn WeatherProvider>> {
    let id = config.default_provider_id()?;
    Ok(provider_from_config(id, config))
}
