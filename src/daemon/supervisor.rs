use crate::config::ReliabilityConfig;
use anyhow::Result;
use std::future::Future;
use tokio::task::JoinHandle;
use tokio::time::Duration;

/// Keep a long-running component alive, restarting it with exponential
/// backoff. After `max_restarts` consecutive failures the circuit opens and
/// the task ends; 0 restarts forever.
pub(super) fn spawn_component_supervisor<F, Fut>(
    name: &'static str,
    reliability: &ReliabilityConfig,
    mut run_component: F,
) -> JoinHandle<()>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    let initial_backoff_secs = reliability.initial_backoff_secs.max(1);
    let max_backoff = reliability.max_backoff_secs.max(initial_backoff_secs);
    let max_restarts = reliability.max_restarts;

    tokio::spawn(async move {
        let mut backoff = initial_backoff_secs;
        let mut consecutive_failures: u32 = 0;

        loop {
            tracing::info!("Daemon component '{name}' starting");
            match run_component().await {
                Ok(()) => {
                    tracing::warn!("Daemon component '{name}' exited unexpectedly");
                    backoff = initial_backoff_secs;
                    consecutive_failures = consecutive_failures.saturating_add(1);
                }
                Err(e) => {
                    tracing::error!("Daemon component '{name}' failed: {e:#}");
                    consecutive_failures = consecutive_failures.saturating_add(1);
                }
            }

            if max_restarts > 0 && consecutive_failures > max_restarts {
                tracing::error!(
                    "Daemon component '{name}' exceeded max restarts ({max_restarts}), circuit open"
                );
                break;
            }
            tokio::time::sleep(Duration::from_secs(backoff)).await;
            backoff = backoff.saturating_mul(2).min(max_backoff);
        }
    })
}
