//! The chained current → forecast → pollution fetch and the view state it feeds.

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use crate::{
    model::{StageOutcome, StageOutcomes, ViewState},
    provider::{ApiError, WeatherApi},
};

/// 3-hour slots kept from the forecast list (24 hours).
pub const FORECAST_SLOTS: usize = 8;

pub const CURRENT_FAILED: &str = "Error fetching weather data. Please try again.";
pub const UNEXPECTED_FAILURE: &str = "An unexpected error occurred. Please try again.";
pub const FORECAST_FAILED: &str =
    "Failed to fetch 3-hour weather forecast data. Please try again later.";
pub const POLLUTION_FAILED: &str = "Failed to fetch air pollution data. Please try again later.";

/// Runs fetches against a [`WeatherApi`] and publishes the resulting [`ViewState`].
///
/// Every run is stamped with a generation number. Only the most recently
/// started run may write to the view state; an overtaken run stops at its
/// next stage boundary and its responses are dropped.
#[derive(Debug, Clone)]
pub struct FetchPipeline {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    api: Arc<dyn WeatherApi>,
    state: watch::Sender<ViewState>,
    latest: AtomicU64,
}

impl FetchPipeline {
    pub fn new(api: Arc<dyn WeatherApi>) -> Self {
        let (state, _) = watch::channel(ViewState::default());
        Self {
            inner: Arc::new(Inner {
                api,
                state,
                latest: AtomicU64::new(0),
            }),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.inner.state.subscribe()
    }

    pub fn snapshot(&self) -> ViewState {
        self.inner.state.borrow().clone()
    }

    /// Record what the user typed. Not tied to any run.
    pub fn set_search_term(&self, term: &str) {
        self.inner.state.send_if_modified(|state| {
            if state.search_term == term {
                return false;
            }
            state.search_term = term.to_string();
            true
        });
    }

    /// Apply `update` only if `generation` is still the newest run.
    fn apply(&self, generation: u64, update: impl FnOnce(&mut ViewState)) -> bool {
        let latest = &self.inner.latest;
        self.inner.state.send_if_modified(|state| {
            if latest.load(Ordering::SeqCst) != generation {
                return false;
            }
            update(state);
            state.generation = generation;
            true
        })
    }

    /// Fetch everything for `city`. Never fails: errors end up in the view state.
    ///
    /// Returns the generation assigned to this run.
    #[instrument(skip(self), fields(generation = tracing::field::Empty))]
    pub async fn run(&self, city: &str) -> u64 {
        let generation = self.inner.latest.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::Span::current().record("generation", generation);
        info!("fetch pipeline started");

        self.apply(generation, |state| {
            state.loading = true;
            state.error = None;
            state.stages = StageOutcomes::default();
        });

        let weather = match self.inner.api.current(city).await {
            Ok(weather) => weather,
            Err(err) => {
                let message = current_failure_message(&err);
                warn!(error = %err, "current conditions failed, aborting run");
                self.apply(generation, |state| {
                    state.stages.current = StageOutcome::Failed(message.clone());
                    state.error = Some(message);
                    state.loading = false;
                });
                return generation;
            }
        };

        let coord = weather.coord;
        let applied = self.apply(generation, |state| {
            state.weather = Some(weather);
            state.stages.current = StageOutcome::Succeeded;
        });
        if !applied {
            debug!("superseded after current conditions");
            return generation;
        }

        let forecast = self.inner.api.forecast(coord).await;
        let applied = self.apply(generation, |state| match forecast {
            Ok(mut entries) => {
                entries.truncate(FORECAST_SLOTS);
                state.forecast = entries;
                state.stages.forecast = StageOutcome::Succeeded;
            }
            Err(err) => {
                warn!(error = %err, "forecast failed");
                state.stages.forecast = StageOutcome::Failed(FORECAST_FAILED.to_string());
                state.error = Some(FORECAST_FAILED.to_string());
            }
        });
        if !applied {
            debug!("superseded after forecast");
            return generation;
        }

        let pollution = self.inner.api.pollution(coord).await;
        let applied = self.apply(generation, |state| {
            match pollution {
                Ok(snapshot) => {
                    state.pollution = Some(snapshot);
                    state.stages.pollution = StageOutcome::Succeeded;
                }
                Err(err) => {
                    warn!(error = %err, "air pollution failed");
                    state.stages.pollution = StageOutcome::Failed(POLLUTION_FAILED.to_string());
                    state.error = Some(POLLUTION_FAILED.to_string());
                }
            }
            state.loading = false;
        });
        if applied {
            info!("fetch pipeline finished");
        } else {
            debug!("superseded after air pollution");
        }

        generation
    }
}

/// User-facing message for a failed current-conditions request.
pub fn current_failure_message(err: &ApiError) -> String {
    if let Some(message) = err.provider_message() {
        return message.to_string();
    }
    if err.is_http() {
        CURRENT_FAILED.to_string()
    } else {
        UNEXPECTED_FAILURE.to_string()
    }
}
