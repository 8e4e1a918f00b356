//! Core library for the `cityweather` viewer.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The OpenWeather client behind the [`WeatherApi`] trait
//! - A debounced, generation-guarded fetch pipeline feeding a [`ViewState`]
//! - Key/value storage for the last searched city
//! - Formatting helpers for front-ends
//!
//! It is used by `cityweather-cli`, but can also be reused by other front-ends.

pub mod config;
pub mod controller;
pub mod debounce;
pub mod display;
pub mod model;
pub mod pipeline;
pub mod provider;
pub mod storage;

#[cfg(test)]
mod testing;

pub use config::Config;
pub use controller::WeatherController;
pub use model::{
    Coordinates, ForecastEntry, PollutionSnapshot, StageOutcome, StageOutcomes, ViewState,
    WeatherSnapshot,
};
pub use pipeline::FetchPipeline;
pub use provider::{ApiError, OpenWeatherClient, WeatherApi};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
