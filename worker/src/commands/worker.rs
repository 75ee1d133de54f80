//! Long-running polling worker.

use crate::cli::RunArgs;
use crate::state::AppState;
use anyhow::{bail, Result};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, warn};
use vigil_scheduler::{CancellationToken, FixedDelay};

/// Process queued runs on a fixed delay until Ctrl-C.
pub async fn run(state: &AppState, args: &RunArgs) -> Result<()> {
    let cancel = CancellationToken::new();

    tokio::spawn(cancel_on_signal(tokio::signal::ctrl_c(), cancel.clone()));

    poll_queue(state, args, cancel).await
}

/// Cancel `cancel` once `signal` resolves. A signal handler that failed to
/// register leaves the token alone so the worker keeps running.
pub async fn cancel_on_signal<S>(signal: S, cancel: CancellationToken)
where
    S: Future<Output = std::io::Result<()>>,
{
    match signal.await {
        Ok(()) => {
            info!("Shutdown requested");
            cancel.cancel();
        }
        Err(e) => warn!("Failed to listen for Ctrl-C, stop the process to exit: {}", e),
    }
}

/// Effective poll interval: the CLI override or the configured value.
///
/// Zero is rejected like `worker.poll_interval_ms = 0` is in the config.
pub fn poll_interval(state: &AppState, args: &RunArgs) -> Result<Duration> {
    let ms = args.interval_ms.unwrap_or(state.config.worker.poll_interval_ms);
    if ms == 0 {
        bail!("poll interval must be greater than 0 ms");
    }
    Ok(Duration::from_millis(ms))
}

/// Drive the queue until `cancel` fires. Split out so it can be stopped
/// without a signal.
pub async fn poll_queue(state: &AppState, args: &RunArgs, cancel: CancellationToken) -> Result<()> {
    let schedule = FixedDelay::new(
        "process queued audit runs",
        Duration::from_millis(state.config.worker.initial_delay_ms),
        poll_interval(state, args)?,
    );

    let service = &state.service;
    schedule
        .run(cancel, || async move {
            let processed = service.process_next_queued_run().await?;
            if processed.is_none() {
                debug!("No queued audit run found");
            }
            Ok::<_, vigil_audit::AuditError>(())
        })
        .await;
    Ok(())
}
