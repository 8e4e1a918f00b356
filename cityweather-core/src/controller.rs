//! Wires text input through the debouncer into storage and the fetch pipeline.

use std::{sync::Arc, time::Duration};
use tokio::{
    sync::{mpsc, watch},
    task::{JoinHandle, JoinSet},
};
use tracing::{debug, info, warn};

use crate::{
    debounce::Debouncer,
    model::ViewState,
    pipeline::FetchPipeline,
    provider::WeatherApi,
    storage::{CITY_KEY, KeyValueStore},
};

#[derive(Debug)]
pub struct WeatherController {
    pipeline: FetchPipeline,
    debouncer: Debouncer<String>,
    settle_task: JoinHandle<()>,
}

impl WeatherController {
    /// Read the remembered city, kick off a fetch for it right away, and
    /// start listening for input.
    pub async fn start(
        api: Arc<dyn WeatherApi>,
        store: Arc<dyn KeyValueStore>,
        quiet: Duration,
    ) -> Self {
        let pipeline = FetchPipeline::new(api);
        let (debouncer, settled) = Debouncer::spawn(quiet);

        let seed = match store.get(CITY_KEY).await {
            Ok(seed) => seed,
            Err(err) => {
                warn!(error = %err, "could not read remembered city");
                None
            }
        };
        if let Some(city) = &seed {
            info!(city = %city, "restoring remembered city");
            pipeline.set_search_term(city);
        }

        let settle_task = tokio::spawn(settle_loop(seed, settled, pipeline.clone(), store));

        Self {
            pipeline,
            debouncer,
            settle_task,
        }
    }

    /// Feed the current contents of the search box.
    pub fn input(&self, text: impl Into<String>) {
        let text = text.into();
        self.pipeline.set_search_term(&text);
        if !self.debouncer.push(text) {
            warn!("debouncer stopped, input ignored");
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.pipeline.subscribe()
    }

    pub fn snapshot(&self) -> ViewState {
        self.pipeline.snapshot()
    }

    /// Stop taking input and wait for in-flight fetches to settle.
    ///
    /// Input still inside its quiet period is dropped.
    pub async fn shutdown(self) -> ViewState {
        self.debouncer.close().await;
        if let Err(err) = self.settle_task.await {
            warn!(error = %err, "settle task ended abnormally");
        }
        self.pipeline.snapshot()
    }
}

async fn settle_loop(
    seed: Option<String>,
    mut settled: mpsc::UnboundedReceiver<String>,
    pipeline: FetchPipeline,
    store: Arc<dyn KeyValueStore>,
) {
    let mut runs = JoinSet::new();

    if let Some(city) = seed {
        settle(city, &pipeline, store.as_ref(), &mut runs).await;
    }

    loop {
        tokio::select! {
            value = settled.recv() => match value {
                Some(value) => settle(value, &pipeline, store.as_ref(), &mut runs).await,
                None => break,
            },
            Some(_) = runs.join_next(), if !runs.is_empty() => {}
        }
    }

    while runs.join_next().await.is_some() {}
}

/// Persist the settled value and, unless it is blank, start a fetch for it.
async fn settle(
    value: String,
    pipeline: &FetchPipeline,
    store: &dyn KeyValueStore,
    runs: &mut JoinSet<u64>,
) {
    if let Err(err) = store.set(CITY_KEY, &value).await {
        warn!(error = %err, "could not remember city");
    }

    if value.trim().is_empty() {
        debug!("blank search term, nothing to fetch");
        return;
    }

    let pipeline = pipeline.clone();
    runs.spawn(async move { pipeline.run(&value).await });
}
