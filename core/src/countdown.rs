//! Client-side countdown of the zone time budget.
//!
//! Mirrors the budget the server enforces: the page receives the remaining
//! seconds at load, counts down once per second and forces the exit when it
//! reaches zero. The server-side 403 sentinel still applies to any request
//! that races the countdown.

use std::time::Duration;

use serde_json::json;
use tokio::sync::watch;

use crate::adapter::RequestAdapter;

/// Below this many seconds the countdown is shown as critical.
pub const CRITICAL_THRESHOLD_SECS: u64 = 15 * 60;

/// Scale of the remaining-time gauge: one eight-hour shift.
pub const GAUGE_BASE_SECS: u64 = 8 * 60 * 60;

/// Pause between the exit notice and the exit call.
pub const EXIT_GRACE: Duration = Duration::from_secs(3);

#[derive(Debug)]
pub struct SessionCountdown {
    remaining: u64,
    tx: watch::Sender<u64>,
}

impl SessionCountdown {
    pub fn new(remaining_secs: u64) -> Self {
        let (tx, _) = watch::channel(remaining_secs);
        Self {
            remaining: remaining_secs,
            tx,
        }
    }

    /// Observe the remaining seconds as they tick down.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.tx.subscribe()
    }

    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    /// `H:MM` with at least an hour left, `M:SS` otherwise.
    pub fn display(&self) -> String {
        format_remaining(self.remaining)
    }

    pub fn is_critical(&self) -> bool {
        self.remaining < CRITICAL_THRESHOLD_SECS
    }

    /// Share of an eight-hour shift still available, clamped to `[0, 1]`.
    pub fn fraction_remaining(&self) -> f64 {
        (self.remaining as f64 / GAUGE_BASE_SECS as f64).clamp(0.0, 1.0)
    }

    /// Count down to zero, then force the exit from the zone.
    ///
    /// The exit posts `{}` to `exit_url`, ignores its outcome and navigates
    /// to `dashboard_url`.
    pub async fn run(mut self, adapter: &RequestAdapter, exit_url: &str, dashboard_url: &str) {
        if self.remaining == 0 {
            force_exit(adapter, "Workday finished.", exit_url, dashboard_url).await;
            return;
        }

        let mut interval = tokio::time::interval(Duration::from_secs(1));
        // The first tick completes immediately.
        interval.tick().await;
        while self.remaining > 0 {
            interval.tick().await;
            self.remaining -= 1;
            self.tx.send_replace(self.remaining);
            if self.remaining == CRITICAL_THRESHOLD_SECS - 1 {
                tracing::info!("zone time budget is critical");
            }
        }

        force_exit(adapter, "Your time in the zone has ended.", exit_url, dashboard_url).await;
    }
}

pub fn format_remaining(total_secs: u64) -> String {
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    if hours > 0 {
        format!("{hours}:{minutes:02}")
    } else {
        format!("{minutes}:{seconds:02}")
    }
}

async fn force_exit(adapter: &RequestAdapter, reason: &str, exit_url: &str, dashboard_url: &str) {
    tracing::warn!(reason, "forcing zone exit");
    adapter.notifier().show_error("Time exhausted", reason).await;
    tokio::time::sleep(EXIT_GRACE).await;
    if let Err(err) = adapter.post(exit_url, json!({})).await {
        tracing::warn!(error = %err, "zone exit call failed");
    }
    adapter.navigator().assign(dashboard_url);
}
