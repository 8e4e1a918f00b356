use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Geographic position as reported in the `coord` field of current conditions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

/// Latest current-conditions result for a city.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub location_name: String,
    pub observation_time: DateTime<Utc>,
    pub temperature_c: f64,
    pub humidity_pct: u8,
    pub pressure_hpa: f64,
    pub wind_speed_mps: f64,
    pub description: String,
    pub icon: String,
    pub coord: Coordinates,
}

/// One 3-hour slot of the forecast strip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastEntry {
    /// Unix timestamp (seconds) of the slot.
    pub dt: i64,
    pub temperature_c: f64,
    pub description: String,
    pub icon: String,
}

/// First entry of the air-pollution list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollutionSnapshot {
    /// Air quality index, 1 (good) to 5 (very poor) when the provider behaves.
    pub aqi: i64,
    pub observation_time: DateTime<Utc>,
    /// Pollutant name (`co`, `o3`, `pm2_5`, ...) to concentration in µg/m³.
    pub components: BTreeMap<String, f64>,
}

impl PollutionSnapshot {
    pub fn component(&self, name: &str) -> Option<f64> {
        self.components.get(name).copied()
    }
}

/// Result of a single pipeline stage in the most recent run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StageOutcome {
    #[default]
    NotAttempted,
    Succeeded,
    Failed(String),
}

impl StageOutcome {
    pub fn failure(&self) -> Option<&str> {
        match self {
            StageOutcome::Failed(reason) => Some(reason),
            _ => None,
        }
    }
}

/// Per-stage outcomes of the latest pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StageOutcomes {
    pub current: StageOutcome,
    pub forecast: StageOutcome,
    pub pollution: StageOutcome,
}

/// Everything the presentation layer needs to draw a frame.
///
/// Data fields are snapshots: replaced on a successful stage, left untouched
/// on a failed one.
#[derive(Debug, Clone, Default)]
pub struct ViewState {
    /// Text the user last entered (or the value seeded from storage).
    pub search_term: String,
    pub loading: bool,
    /// Message of the most recent failure in the current run.
    pub error: Option<String>,
    pub weather: Option<WeatherSnapshot>,
    pub pollution: Option<PollutionSnapshot>,
    pub forecast: Vec<ForecastEntry>,
    pub stages: StageOutcomes,
    /// Generation of the pipeline run that last wrote this state; 0 before any run.
    pub generation: u64,
}
