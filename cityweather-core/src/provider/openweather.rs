use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::{collections::BTreeMap, time::Duration};
use tracing::debug;

use crate::{
    config::DEFAULT_BASE_URL,
    model::{Coordinates, ForecastEntry, PollutionSnapshot, WeatherSnapshot},
};

use super::{ApiError, WeatherApi};

const CURRENT: &str = "weather";
const FORECAST: &str = "forecast";
const AIR_POLLUTION: &str = "air_pollution";

#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    api_key: String,
    base_url: String,
    http: Client,
}

#[derive(Debug)]
pub struct OpenWeatherClientBuilder {
    api_key: String,
    base_url: String,
    timeout: Option<Duration>,
}

impl OpenWeatherClientBuilder {
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// `None` leaves requests without a deadline.
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> Result<OpenWeatherClient> {
        let mut http = Client::builder();
        if let Some(timeout) = self.timeout {
            http = http.timeout(timeout);
        }
        let http = http.build().context("Failed to build HTTP client")?;

        Ok(OpenWeatherClient {
            api_key: self.api_key,
            base_url: self.base_url,
            http,
        })
    }
}

impl OpenWeatherClient {
    pub fn builder(api_key: String) -> OpenWeatherClientBuilder {
        OpenWeatherClientBuilder {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: None,
        }
    }

    fn endpoint_url(&self, endpoint: &str) -> String {
        format!("{}/data/2.5/{endpoint}", self.base_url)
    }

    /// Issue a GET and return the body of a 2xx response.
    async fn get_body(
        &self,
        endpoint: &'static str,
        query: &[(&str, &str)],
    ) -> Result<String, ApiError> {
        let url = self.endpoint_url(endpoint);
        debug!(%url, "sending OpenWeather request");

        let res = self
            .http
            .get(&url)
            .query(query)
            .query(&[("appid", self.api_key.as_str())])
            .send()
            .await
            .map_err(|source| ApiError::Transport { endpoint, source })?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|source| ApiError::Transport { endpoint, source })?;

        if !status.is_success() {
            return Err(ApiError::Provider {
                endpoint,
                status: status.as_u16(),
                message: parse_error_message(&body),
            });
        }

        Ok(body)
    }
}

#[async_trait]
impl WeatherApi for OpenWeatherClient {
    async fn current(&self, city: &str) -> Result<WeatherSnapshot, ApiError> {
        let body = self
            .get_body(CURRENT, &[("q", city), ("units", "metric")])
            .await?;
        parse_current(&body)
    }

    async fn forecast(&self, coord: Coordinates) -> Result<Vec<ForecastEntry>, ApiError> {
        let (lat, lon) = (coord.lat.to_string(), coord.lon.to_string());
        let body = self
            .get_body(FORECAST, &[("lat", &lat), ("lon", &lon), ("units", "metric")])
            .await?;
        parse_forecast(&body)
    }

    async fn pollution(&self, coord: Coordinates) -> Result<PollutionSnapshot, ApiError> {
        let (lat, lon) = (coord.lat.to_string(), coord.lon.to_string());
        let body = self
            .get_body(AIR_POLLUTION, &[("lat", &lat), ("lon", &lon)])
            .await?;
        parse_pollution(&body)
    }
}

#[derive(Debug, Deserialize)]
struct OwErrorBody {
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OwCoord {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct OwCondition {
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    pressure: f64,
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    #[serde(default)]
    name: String,
    dt: i64,
    coord: OwCoord,
    main: OwMain,
    weather: Vec<OwCondition>,
    wind: OwWind,
}

#[derive(Debug, Deserialize)]
struct OwForecastMain {
    temp: f64,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt: i64,
    main: OwForecastMain,
    weather: Vec<OwCondition>,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    list: Vec<OwForecastEntry>,
}

#[derive(Debug, Deserialize)]
struct OwAqi {
    aqi: i64,
}

#[derive(Debug, Deserialize)]
struct OwPollutionEntry {
    dt: i64,
    main: OwAqi,
    components: BTreeMap<String, f64>,
}

#[derive(Debug, Deserialize)]
struct OwPollutionResponse {
    list: Vec<OwPollutionEntry>,
}

fn parse_error_message(body: &str) -> Option<String> {
    serde_json::from_str::<OwErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
}

fn decode<'a, T: Deserialize<'a>>(endpoint: &'static str, body: &'a str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|source| ApiError::Decode { endpoint, source })
}

/// First condition's description and icon; the provider always sends at least one.
fn first_condition(conditions: Vec<OwCondition>) -> (String, String) {
    conditions
        .into_iter()
        .next()
        .map(|c| (c.description, c.icon))
        .unwrap_or_else(|| ("Unknown".to_string(), String::new()))
}

fn parse_current(body: &str) -> Result<WeatherSnapshot, ApiError> {
    let parsed: OwCurrentResponse = decode(CURRENT, body)?;
    let (description, icon) = first_condition(parsed.weather);

    Ok(WeatherSnapshot {
        location_name: parsed.name,
        observation_time: unix_to_utc(parsed.dt).unwrap_or_else(Utc::now),
        temperature_c: parsed.main.temp,
        humidity_pct: parsed.main.humidity,
        pressure_hpa: parsed.main.pressure,
        wind_speed_mps: parsed.wind.speed,
        description,
        icon,
        coord: Coordinates {
            lat: parsed.coord.lat,
            lon: parsed.coord.lon,
        },
    })
}

fn parse_forecast(body: &str) -> Result<Vec<ForecastEntry>, ApiError> {
    let parsed: OwForecastResponse = decode(FORECAST, body)?;

    Ok(parsed
        .list
        .into_iter()
        .map(|entry| {
            let (description, icon) = first_condition(entry.weather);
            ForecastEntry {
                dt: entry.dt,
                temperature_c: entry.main.temp,
                description,
                icon,
            }
        })
        .collect())
}

fn parse_pollution(body: &str) -> Result<PollutionSnapshot, ApiError> {
    let parsed: OwPollutionResponse = decode(AIR_POLLUTION, body)?;

    let first = parsed
        .list
        .into_iter()
        .next()
        .ok_or(ApiError::EmptyResponse { endpoint: AIR_POLLUTION })?;

    Ok(PollutionSnapshot {
        aqi: first.main.aqi,
        observation_time: unix_to_utc(first.dt).unwrap_or_else(Utc::now),
        components: first.components,
    })
}

fn unix_to_utc(ts: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(ts, 0)
}
