// src/progress/driver.rs

//! Per-command notification state machine: start, periodic spinner updates,
//! finish. One driver instance exists per in-flight command and never
//! outlives it.

use std::sync::Arc;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::debug;

use super::{ProgressAdapter, ProgressContext, Severity};

/// Spinner animation settings, taken from configuration.
#[derive(Debug, Clone)]
pub struct SpinnerConfig {
    pub interval_ms: u64,
    pub frames: Vec<String>,
}

impl Default for SpinnerConfig {
    fn default() -> Self {
        Self {
            interval_ms: 150,
            frames: ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DriverState {
    Idle,
    Announcing,
    Done,
}

/// The ticker task plus its stop channel. Owned exclusively by the driver;
/// stopping it is the only way a stale tick is prevented from emitting.
struct SpinnerState {
    stop_tx: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

pub struct ProgressDriver {
    adapter: Option<Arc<dyn ProgressAdapter>>,
    spinner: Option<SpinnerConfig>,
    ctx: Arc<ProgressContext>,
    state: DriverState,
    token: Option<Arc<str>>,
    ticker: Option<SpinnerState>,
}

impl ProgressDriver {
    pub fn new(
        adapter: Option<Arc<dyn ProgressAdapter>>,
        spinner: Option<SpinnerConfig>,
        ctx: ProgressContext,
    ) -> Self {
        Self {
            adapter,
            spinner,
            ctx: Arc::new(ctx),
            state: DriverState::Idle,
            token: None,
            ticker: None,
        }
    }

    /// Announce the command and begin the spinner animation.
    ///
    /// Idle → Announcing. A second call is a no-op. Without an adapter this
    /// degrades to a single log line.
    pub fn start(&mut self, message: &str) {
        if self.state != DriverState::Idle {
            return;
        }
        self.state = DriverState::Announcing;

        let Some(adapter) = self.adapter.clone() else {
            debug!(command_id = self.ctx.command_id, %message, "progress start (no adapter)");
            return;
        };

        let token: Option<Arc<str>> = adapter.start(message, &self.ctx).map(Arc::from);
        self.token = token.clone();

        let Some(spinner) = self.spinner.clone() else {
            return;
        };
        if spinner.frames.is_empty() {
            return;
        }

        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
        let ctx = Arc::clone(&self.ctx);
        let base = message.to_string();

        let handle = tokio::spawn(async move {
            let mut interval =
                tokio::time::interval(std::time::Duration::from_millis(spinner.interval_ms.max(1)));
            // The first tick fires immediately; skip it so the start
            // notification is not instantly repainted.
            interval.tick().await;

            let mut index = 0usize;
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        let frame = &spinner.frames[index % spinner.frames.len()];
                        index = index.wrapping_add(1);
                        adapter.update(
                            token.as_deref(),
                            &format!("{frame} {base}"),
                            &ctx,
                        );
                    }
                    _ = &mut stop_rx => break,
                }
            }
        });

        self.ticker = Some(SpinnerState { stop_tx, handle });
    }

    /// Final notification. Announcing → Done; idempotent, and a no-op when
    /// `start` was never called. Stops the ticker before the finish hook runs
    /// so no update can land after the final message.
    pub fn finish(&mut self, message: &str, severity: Severity) {
        if self.state != DriverState::Announcing {
            return;
        }
        self.state = DriverState::Done;

        if let Some(ticker) = self.ticker.take() {
            // The task also ends when the sender drops; the explicit send
            // keeps shutdown prompt.
            let _ = ticker.stop_tx.send(());
            ticker.handle.abort();
        }

        match &self.adapter {
            Some(adapter) => {
                adapter.finish(self.token.as_deref(), message, severity, &self.ctx);
            }
            None => {
                debug!(command_id = self.ctx.command_id, %message, "progress finish (no adapter)");
            }
        }
        self.token = None;
    }

    pub fn is_done(&self) -> bool {
        self.state == DriverState::Done
    }
}

impl Drop for ProgressDriver {
    fn drop(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.handle.abort();
        }
    }
}
