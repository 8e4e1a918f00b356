//! Quiet-period filter for rapidly changing input.
//!
//! Every value restarts the countdown; only a value that survives a full
//! quiet period is forwarded, and it is forwarded exactly once.

use std::time::Duration;
use tokio::{
    sync::mpsc,
    task::JoinHandle,
    time::{self, Instant},
};
use tracing::{trace, warn};

/// Handle to a running debounce task.
#[derive(Debug)]
pub struct Debouncer<T> {
    input: mpsc::UnboundedSender<T>,
    task: JoinHandle<()>,
}

impl<T: Send + 'static> Debouncer<T> {
    /// Spawn the debounce task; settled values arrive on the returned receiver.
    pub fn spawn(quiet: Duration) -> (Self, mpsc::UnboundedReceiver<T>) {
        let (input, input_rx) = mpsc::unbounded_channel();
        let (output, output_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run(input_rx, output, quiet));

        (Self { input, task }, output_rx)
    }

    /// Feed a new value, cancelling any countdown in progress.
    ///
    /// Returns `false` once the task has stopped.
    pub fn push(&self, value: T) -> bool {
        self.input.send(value).is_ok()
    }

    /// Stop accepting input. A value still waiting for its quiet period is dropped.
    pub async fn close(self) {
        drop(self.input);
        if let Err(err) = self.task.await {
            warn!(error = %err, "debounce task ended abnormally");
        }
    }
}

async fn run<T>(
    mut input: mpsc::UnboundedReceiver<T>,
    output: mpsc::UnboundedSender<T>,
    quiet: Duration,
) {
    let mut pending: Option<T> = None;
    let countdown = time::sleep(quiet);
    tokio::pin!(countdown);

    loop {
        tokio::select! {
            biased;

            value = input.recv() => match value {
                Some(value) => {
                    trace!("debounce countdown restarted");
                    pending = Some(value);
                    countdown.as_mut().reset(Instant::now() + quiet);
                }
                None => break,
            },

            () = &mut countdown, if pending.is_some() => {
                if let Some(value) = pending.take() {
                    if output.send(value).is_err() {
                        break;
                    }
                }
            }
        }
    }
}
