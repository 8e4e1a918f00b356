use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use cityweather_core::{
    Config, FetchPipeline, FileStore, KeyValueStore, MemoryStore, ViewState, WeatherController,
    provider::client_from_config, storage::CITY_KEY,
};
use inquire::{InquireError, Password, PasswordDisplayMode, Text};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::render::render;

/// Typed at the watch prompt to leave.
const QUIT: &str = ":q";

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(
    name = "cityweather",
    version,
    about = "Current weather, 24-hour forecast and air quality for a city"
)]
pub struct Cli {
    /// Log debug output to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Neither read nor remember the last searched city.
    #[arg(long, global = true)]
    pub no_persist: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the OpenWeather API key (and optionally a different API base URL).
    Configure,

    /// Fetch and print the weather for a city once.
    Show {
        /// City name, e.g. "Paris" or "Paris,FR".
        city: String,
    },

    /// Interactive search: every line entered is debounced, then fetched.
    Watch,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show { ref city } => show(city, self.store()?).await,
            Command::Watch => watch(self.store()?).await,
        }
    }

    fn store(&self) -> anyhow::Result<Arc<dyn KeyValueStore>> {
        if self.no_persist {
            return Ok(Arc::new(MemoryStore::new()));
        }
        Ok(Arc::new(FileStore::in_data_dir()?))
    }
}

fn configure() -> anyhow::Result<()> {
    let mut cfg = Config::load()?;

    let api_key = Password::new("OpenWeather API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;
    cfg.set_api_key(api_key);

    let base_url = Text::new("API base URL:")
        .with_default(&cfg.base_url)
        .prompt()
        .context("Failed to read API base URL")?;
    cfg.base_url = base_url.trim().to_string();

    cfg.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

async fn show(city: &str, store: Arc<dyn KeyValueStore>) -> anyhow::Result<()> {
    if city.trim().is_empty() {
        bail!("City name must not be empty");
    }

    let cfg = Config::load()?;
    let client = client_from_config(&cfg)?;
    let pipeline = FetchPipeline::new(Arc::new(client));

    pipeline.set_search_term(city);
    pipeline.run(city).await;

    if let Err(err) = store.set(CITY_KEY, city).await {
        warn!(error = %err, "could not remember city");
    }

    println!("{}", render(&pipeline.snapshot()));
    Ok(())
}

async fn watch(store: Arc<dyn KeyValueStore>) -> anyhow::Result<()> {
    let cfg = Config::load()?;
    let client = client_from_config(&cfg)?;
    let controller = WeatherController::start(Arc::new(client), store, cfg.debounce()).await;

    let initial = controller.snapshot().search_term;
    let lines = spawn_prompt(initial);
    run_session(controller, lines, |state| println!("\n{}\n", render(state))).await
}

/// Feed prompt lines to the controller until `:q` or the prompt closes,
/// drawing each settled frame. Returns once the last in-flight fetch is drawn.
async fn run_session(
    controller: WeatherController,
    mut lines: mpsc::UnboundedReceiver<String>,
    mut draw: impl FnMut(&ViewState) + Send + 'static,
) -> anyhow::Result<()> {
    let mut updates = controller.subscribe();
    let printer = tokio::spawn(async move {
        while updates.changed().await.is_ok() {
            let state = updates.borrow_and_update().clone();
            // Only draw settled frames; intermediate stage updates would
            // interleave with the prompt.
            if !state.loading && state.generation > 0 {
                draw(&state);
            }
        }
    });

    while let Some(line) = lines.recv().await {
        if line.trim() == QUIT {
            break;
        }
        controller.input(line);
    }

    // The state channel closes once the controller and its runs are gone,
    // after the printer has seen the final frame.
    controller.shutdown().await;
    printer.await.context("Printer task failed")?;
    Ok(())
}

/// Run the blocking prompt loop on its own thread, forwarding each entered line.
fn spawn_prompt(initial: String) -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();

    std::thread::spawn(move || {
        let mut current = initial;
        loop {
            let answer = Text::new("City:")
                .with_initial_value(&current)
                .with_help_message("Enter to search, :q or Esc to quit")
                .prompt();

            match answer {
                Ok(line) => {
                    current = line.clone();
                    let quit = line.trim() == QUIT;
                    if tx.send(line).is_err() || quit {
                        break;
                    }
                }
                Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => break,
                Err(err) => {
                    debug!(error = %err, "prompt failed");
                    break;
                }
            }
        }
    });

    rx
}
