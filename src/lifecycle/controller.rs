//! Shutdown signal polling and bounded drain

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tokio::time::MissedTickBehavior;

use super::state::{until_not_running, Lifecycle};
use crate::observability::Logger;

/// How serving ended after a drain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainOutcome {
    /// Every in-flight request finished within the drain timeout.
    Completed,
    /// The drain timeout elapsed and the server was abandoned.
    TimedOut,
}

impl DrainOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            DrainOutcome::Completed => "completed",
            DrainOutcome::TimedOut => "timed_out",
        }
    }
}

/// Watches for the flash marker file and starts the drain when it appears.
///
/// The marker's existence is the only trigger; its content is never read.
#[derive(Debug, Clone)]
pub struct LifecycleController {
    lifecycle: Lifecycle,
    marker: PathBuf,
    poll_interval: Duration,
}

impl LifecycleController {
    pub fn new(lifecycle: Lifecycle, marker: impl Into<PathBuf>, poll_interval: Duration) -> Self {
        Self {
            lifecycle,
            marker: marker.into(),
            poll_interval,
        }
    }

    /// Polls until the marker appears or the lifecycle leaves `Running` for
    /// another reason.
    pub async fn run(self) {
        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            if !self.lifecycle.is_running() {
                return;
            }

            if matches!(tokio::fs::try_exists(&self.marker).await, Ok(true)) {
                if self.lifecycle.begin_drain() {
                    let marker = self.marker.display().to_string();
                    Logger::warn("DRAIN_STARTED", &[("marker", marker.as_str())]);
                }
                return;
            }
        }
    }
}

/// Serves `router` until the lifecycle leaves `Running`, then waits at most
/// `drain_timeout` for in-flight requests before giving up on them.
///
/// On return the lifecycle is `Stopped`.
pub async fn serve_with_drain(
    listener: TcpListener,
    router: Router,
    lifecycle: Lifecycle,
    drain_timeout: Duration,
) -> io::Result<DrainOutcome> {
    let shutdown = until_not_running(lifecycle.subscribe());
    let server = axum::serve(listener, router).with_graceful_shutdown(shutdown);
    let mut handle = tokio::spawn(async move { server.await });

    tokio::select! {
        joined = &mut handle => {
            // Server ended on its own, without a drain signal.
            lifecycle.mark_stopped();
            flatten(joined)?;
            return Ok(DrainOutcome::Completed);
        }
        _ = until_not_running(lifecycle.subscribe()) => {}
    }

    let outcome = match tokio::time::timeout(drain_timeout, &mut handle).await {
        Ok(joined) => {
            if let Err(e) = flatten(joined) {
                let error = e.to_string();
                Logger::error("SERVER_ERROR_DURING_DRAIN", &[("error", error.as_str())]);
            }
            DrainOutcome::Completed
        }
        Err(_) => {
            handle.abort();
            DrainOutcome::TimedOut
        }
    };

    lifecycle.mark_stopped();
    let timeout_ms = drain_timeout.as_millis().to_string();
    Logger::info(
        "DRAIN_FINISHED",
        &[("outcome", outcome.as_str()), ("timeout_ms", timeout_ms.as_str())],
    );
    Ok(outcome)
}

fn flatten(joined: Result<io::Result<()>, tokio::task::JoinError>) -> io::Result<()> {
    joined.map_err(|e| io::Error::new(io::ErrorKind::Other, e))?
}
