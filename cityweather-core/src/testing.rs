//! In-memory `WeatherApi` used by the pipeline and controller tests.

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use std::{
    collections::{BTreeMap, HashMap},
    sync::Mutex,
    time::Duration,
};

use crate::{
    model::{Coordinates, ForecastEntry, PollutionSnapshot, WeatherSnapshot},
    provider::{ApiError, WeatherApi},
};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Current(String),
    Forecast(Coordinates),
    Pollution(Coordinates),
}

#[derive(Debug, Clone)]
pub enum FakeFailure {
    Provider { message: Option<String> },
    Decode,
}

impl FakeFailure {
    fn to_error(&self, endpoint: &'static str) -> ApiError {
        match self {
            FakeFailure::Provider { message } => ApiError::Provider {
                endpoint,
                status: 500,
                message: message.clone(),
            },
            FakeFailure::Decode => ApiError::Decode {
                endpoint,
                source: serde_json::from_str::<serde_json::Value>("{").unwrap_err(),
            },
        }
    }
}

#[derive(Debug)]
pub struct FakeApi {
    cities: HashMap<String, Coordinates>,
    current_failures: HashMap<String, FakeFailure>,
    current_delays: HashMap<String, Duration>,
    forecast_len: usize,
    forecast_fails: bool,
    pollution_fails: bool,
    pollution_delay: Duration,
    calls: Mutex<Vec<Call>>,
}

impl Default for FakeApi {
    fn default() -> Self {
        Self {
            cities: HashMap::new(),
            current_failures: HashMap::new(),
            current_delays: HashMap::new(),
            forecast_len: 12,
            forecast_fails: false,
            pollution_fails: false,
            pollution_delay: Duration::ZERO,
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl FakeApi {
    pub fn with_city(mut self, name: &str, lat: f64, lon: f64) -> Self {
        self.cities.insert(name.to_string(), Coordinates { lat, lon });
        self
    }

    pub fn with_current_failure(mut self, name: &str, failure: FakeFailure) -> Self {
        self.current_failures.insert(name.to_string(), failure);
        self
    }

    pub fn with_current_delay(mut self, name: &str, delay: Duration) -> Self {
        self.current_delays.insert(name.to_string(), delay);
        self
    }

    pub fn with_forecast_len(mut self, len: usize) -> Self {
        self.forecast_len = len;
        self
    }

    pub fn with_pollution_delay(mut self, delay: Duration) -> Self {
        self.pollution_delay = delay;
        self
    }

    pub fn failing_forecast(mut self) -> Self {
        self.forecast_fails = true;
        self
    }

    pub fn failing_pollution(mut self) -> Self {
        self.pollution_fails = true;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().expect("calls lock").clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().expect("calls lock").push(call);
    }
}

#[async_trait]
impl WeatherApi for FakeApi {
    async fn current(&self, city: &str) -> Result<WeatherSnapshot, ApiError> {
        self.record(Call::Current(city.to_string()));
        if let Some(delay) = self.current_delays.get(city) {
            tokio::time::sleep(*delay).await;
        }
        if let Some(failure) = self.current_failures.get(city) {
            return Err(failure.to_error("weather"));
        }

        let coord = self.cities.get(city).copied().ok_or(ApiError::Provider {
            endpoint: "weather",
            status: 404,
            message: Some("city not found".to_string()),
        })?;

        Ok(WeatherSnapshot {
            location_name: city.to_string(),
            observation_time: Utc.timestamp_opt(1_718_000_000, 0).unwrap(),
            temperature_c: 18.4,
            humidity_pct: 64,
            pressure_hpa: 1017.0,
            wind_speed_mps: 3.6,
            description: "clear sky".to_string(),
            icon: "01d".to_string(),
            coord,
        })
    }

    async fn forecast(&self, coord: Coordinates) -> Result<Vec<ForecastEntry>, ApiError> {
        self.record(Call::Forecast(coord));
        if self.forecast_fails {
            return Err(FakeFailure::Provider { message: None }.to_error("forecast"));
        }

        Ok((0..self.forecast_len as i64)
            .map(|i| ForecastEntry {
                dt: 40_000 - i * 10_800,
                temperature_c: 10.0 + i as f64,
                description: "few clouds".to_string(),
                icon: "02d".to_string(),
            })
            .collect())
    }

    async fn pollution(&self, coord: Coordinates) -> Result<PollutionSnapshot, ApiError> {
        self.record(Call::Pollution(coord));
        if !self.pollution_delay.is_zero() {
            tokio::time::sleep(self.pollution_delay).await;
        }
        if self.pollution_fails {
            return Err(ApiError::EmptyResponse {
                endpoint: "air_pollution",
            });
        }

        Ok(PollutionSnapshot {
            aqi: 2,
            observation_time: Utc.timestamp_opt(1_718_000_000, 0).unwrap(),
            components: BTreeMap::from([("co".to_string(), 201.94), ("o3".to_string(), 68.66)]),
        })
    }
}
