//! Fixed-interval driver for the deviation monitor
//!
//! One cycle per tick; inside a cycle assets are checked strictly in order
//! with a pacing pause after each one. Per-asset errors are logged and never
//! stop the loop. The loop ends when the shutdown flag flips (or its sender
//! is dropped) or after an optional number of cycles.

use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::oracle::{CheckOutcome, DeviationMonitor};
use crate::types::Asset;

/// Per-cycle counters
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CycleStats {
    pub checked: usize,
    pub updated: usize,
    pub failed: usize,
}

pub struct Scheduler {
    assets: Vec<Asset>,
    frequency: Duration,
    pacing: Duration,
    max_cycles: Option<u64>,
}

impl Scheduler {
    pub fn new(assets: Vec<Asset>, frequency: Duration, pacing: Duration) -> Self {
        Self {
            assets,
            frequency,
            pacing,
            max_cycles: None,
        }
    }

    /// Stop after `cycles` complete cycles
    pub fn with_max_cycles(mut self, cycles: u64) -> Self {
        self.max_cycles = Some(cycles);
        self
    }

    /// Drive the monitor until shutdown. The first cycle starts one full
    /// interval after the call. Returns the number of completed cycles.
    pub async fn run(&self, monitor: &mut DeviationMonitor, mut shutdown: watch::Receiver<bool>) -> u64 {
        let mut ticker = interval_at(Instant::now() + self.frequency, self.frequency);
        // A cycle that overruns the interval is followed immediately by the next
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut cycles = 0u64;

        tracing::info!(
            assets = ?self.assets,
            frequency_secs = self.frequency.as_secs(),
            pacing_secs = self.pacing.as_secs(),
            "🚀 Oracle update loop started"
        );

        loop {
            if self.max_cycles.is_some_and(|max| cycles >= max) {
                break;
            }

            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown.changed() => break,
            }
            if *shutdown.borrow() {
                break;
            }

            let Some(stats) = self.run_cycle(monitor, &mut shutdown).await else {
                break;
            };
            cycles += 1;

            tracing::info!(
                cycle = cycles,
                checked = stats.checked,
                updated = stats.updated,
                failed = stats.failed,
                "Oracle cycle complete"
            );
        }

        tracing::info!(cycles, "Oracle update loop stopped");
        cycles
    }

    /// One pass over all assets. `None` when shutdown interrupted the pass.
    pub async fn run_cycle(
        &self,
        monitor: &mut DeviationMonitor,
        shutdown: &mut watch::Receiver<bool>,
    ) -> Option<CycleStats> {
        let mut stats = CycleStats::default();

        for asset in &self.assets {
            stats.checked += 1;
            match monitor.check(asset).await {
                Ok(CheckOutcome::Updated { previous, price, tx }) => {
                    stats.updated += 1;
                    tracing::info!(
                        asset = %asset,
                        previous = previous,
                        price = price,
                        tx_hash = %format!("{:#x}", tx.hash),
                        "Oracle value updated"
                    );
                }
                Ok(CheckOutcome::Unchanged { previous, price }) => {
                    tracing::debug!(asset = %asset, previous = previous, price = price, "Within deviation band");
                }
                Err(e) => {
                    stats.failed += 1;
                    tracing::error!(asset = %asset, error = %e, "❌ Oracle check failed");
                }
            }

            tokio::select! {
                _ = tokio::time::sleep(self.pacing) => {}
                _ = shutdown.changed() => return None,
            }
        }

        Some(stats)
    }
}
