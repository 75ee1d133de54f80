//! Fixed-delay tick loop.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Ticks slower than this are reported when they finish.
const DEFAULT_SLOW_TICK: Duration = Duration::from_secs(60);

/// Counters returned when the loop stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickStats {
    /// Ticks started
    pub ticks: u64,
    /// Ticks that returned an error
    pub failures: u64,
    /// Ticks that exceeded the slow threshold
    pub slow: u64,
}

/// Runs a job repeatedly with a fixed pause between the end of one tick and
/// the start of the next.
#[derive(Debug, Clone)]
pub struct FixedDelay {
    name: String,
    initial_delay: Duration,
    interval: Duration,
    slow_threshold: Duration,
}

impl FixedDelay {
    /// Create a schedule. `name` only appears in logs.
    #[must_use]
    pub fn new(name: impl Into<String>, initial_delay: Duration, interval: Duration) -> Self {
        Self {
            name: name.into(),
            initial_delay,
            interval,
            slow_threshold: DEFAULT_SLOW_TICK,
        }
    }

    /// Override the duration past which a tick is logged as slow.
    #[must_use]
    pub fn with_slow_threshold(mut self, threshold: Duration) -> Self {
        self.slow_threshold = threshold;
        self
    }

    /// Drive `tick` until `cancel` fires.
    ///
    /// A tick in progress is allowed to finish; cancellation is observed
    /// while waiting. Errors are logged and the loop continues.
    pub async fn run<F, Fut, T, E>(&self, cancel: CancellationToken, mut tick: F) -> TickStats
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let mut stats = TickStats::default();
        info!(
            job = %self.name,
            initial_delay_ms = duration_ms(self.initial_delay),
            interval_ms = duration_ms(self.interval),
            "scheduler started"
        );

        if !self.pause(&cancel, self.initial_delay).await {
            info!(job = %self.name, "scheduler cancelled before first tick");
            return stats;
        }

        loop {
            stats.ticks += 1;
            let started = Instant::now();

            if let Err(e) = tick().await {
                stats.failures += 1;
                error!(job = %self.name, error = %e, "scheduled job failed");
            }

            let elapsed = started.elapsed();
            if elapsed > self.slow_threshold {
                stats.slow += 1;
                warn!(job = %self.name, elapsed_ms = duration_ms(elapsed), "scheduled job ran long");
            } else {
                debug!(job = %self.name, elapsed_ms = duration_ms(elapsed), "tick finished");
            }

            if !self.pause(&cancel, self.interval).await {
                break;
            }
        }

        info!(job = %self.name, ticks = stats.ticks, failures = stats.failures, "scheduler stopped");
        stats
    }

    /// Sleep for `delay`. Returns `false` if cancelled first.
    async fn pause(&self, cancel: &CancellationToken, delay: Duration) -> bool {
        if cancel.is_cancelled() {
            return false;
        }
        tokio::select! {
            () = cancel.cancelled() => false,
            () = tokio::time::sleep(delay) => true,
        }
    }
}

fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_stops_after_cancel_and_counts_failures() {
        let cancel = CancellationToken::new();
        let calls = Arc::new(AtomicU32::new(0));

        let schedule = FixedDelay::new("test", Duration::from_millis(10), Duration::from_millis(100));
        let handle = {
            let cancel = cancel.clone();
            let calls = Arc::clone(&calls);
            tokio::spawn(async move {
                schedule
                    .run(cancel, || {
                        let calls = Arc::clone(&calls);
                        async move {
                            let n = calls.fetch_add(1, Ordering::SeqCst);
                            if n % 2 == 0 {
                                Ok(())
                            } else {
                                Err("tick failed")
                            }
                        }
                    })
                    .await
            })
        };

        // Ticks at 10, 110, 210 ms
        tokio::time::sleep(Duration::from_millis(250)).await;
        cancel.cancel();
        let stats = handle.await.expect("join");

        assert_eq!(stats.ticks, 3);
        assert_eq!(stats.failures, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_initial_delay() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        let schedule = FixedDelay::new("test", Duration::from_secs(1), Duration::from_secs(1));
        let stats = schedule
            .run(cancel, || async { Ok::<_, String>(()) })
            .await;

        assert_eq!(stats, TickStats::default());
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_ticks_are_counted() {
        let cancel = CancellationToken::new();
        let schedule = FixedDelay::new("slow", Duration::ZERO, Duration::from_millis(1))
            .with_slow_threshold(Duration::from_millis(50));

        let stop = cancel.clone();
        let stats = schedule
            .run(cancel, move || {
                let stop = stop.clone();
                async move {
                    tokio::time::sleep(Duration::from_millis(80)).await;
                    stop.cancel();
                    Ok::<_, String>(())
                }
            })
            .await;

        assert_eq!(stats.ticks, 1);
        assert_eq!(stats.slow, 1);
    }
}
