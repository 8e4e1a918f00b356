use crate::{
    Config,
    model::{Coordinates, ForecastEntry, PollutionSnapshot, WeatherSnapshot},
};
use async_trait::async_trait;
use std::fmt::Debug;
use thiserror::Error;

pub mod openweather;

pub use openweather::OpenWeatherClient;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint} request failed with status {status}: {}", message.as_deref().unwrap_or("no message"))]
    Provider {
        endpoint: &'static str,
        status: u16,
        /// `message` field of the provider's error payload, if it sent one.
        message: Option<String>,
    },

    #[error("failed to decode {endpoint} response: {source}")]
    Decode {
        endpoint: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("{endpoint} response contained no data")]
    EmptyResponse { endpoint: &'static str },
}

impl ApiError {
    /// Human-readable message supplied by the provider, e.g. "city not found".
    pub fn provider_message(&self) -> Option<&str> {
        match self {
            ApiError::Provider { message, .. } => message.as_deref().filter(|m| !m.is_empty()),
            _ => None,
        }
    }

    /// True for failures of the HTTP exchange itself (network or non-2xx),
    /// as opposed to payloads we could not make sense of.
    pub fn is_http(&self) -> bool {
        matches!(self, ApiError::Transport { .. } | ApiError::Provider { .. })
    }
}

/// The three calls the fetch pipeline makes, in the order it makes them.
#[async_trait]
pub trait WeatherApi: Send + Sync + Debug {
    async fn current(&self, city: &str) -> Result<WeatherSnapshot, ApiError>;

    /// Full forecast list in provider order; callers decide how much to keep.
    async fn forecast(&self, coord: Coordinates) -> Result<Vec<ForecastEntry>, ApiError>;

    async fn pollution(&self, coord: Coordinates) -> Result<PollutionSnapshot, ApiError>;
}

/// Construct the OpenWeather client from config, failing when no API key is available.
pub fn client_from_config(config: &Config) -> anyhow::Result<OpenWeatherClient> {
    let api_key = config.resolve_api_key().ok_or_else(|| {
        anyhow::anyhow!(
            "No OpenWeather API key configured.\n\
             Hint: run `cityweather configure` or set OPENWEATHER_API_KEY."
        )
    })?;

    OpenWeatherClient::builder(api_key)
        .base_url(config.base_url.clone())
        .timeout(config.request_timeout())
        .build()
}
