//! The queue-driven daemon.

mod pipeline;
mod supervisor;

pub use pipeline::{Collaborators, MessageOutcome, Pipeline};

use crate::config::{Config, ReliabilityConfig};
use crate::error::QueueError;
use crate::queue::{Queue, SqsQueue};
use anyhow::{Result, bail};
use std::sync::Arc;
use std::time::Duration;
use supervisor::spawn_component_supervisor;

/// Receive one batch and handle every message in it.
///
/// Each message is acknowledged after handling, whether or not handling
/// succeeded, so a poison message is never redelivered.
pub async fn poll_once(queue: &dyn Queue, pipeline: &Pipeline) -> Result<usize, QueueError> {
    let messages = queue.poll().await?;
    for message in &messages {
        match pipeline.handle_message(message).await {
            Ok(outcome) => tracing::debug!(message = %message.id, ?outcome, "message handled"),
            Err(e) => tracing::error!(message = %message.id, "message failed: {e:#}"),
        }
        if let Err(e) = queue.acknowledge(message).await {
            tracing::error!(message = %message.id, queue = queue.name(), "{e}");
        }
    }
    Ok(messages.len())
}

/// Poll forever. Queue errors are logged and retried with exponential
/// backoff; a successful poll resets the delay.
pub async fn poll_loop(
    queue: &dyn Queue,
    pipeline: &Pipeline,
    interval: Duration,
    reliability: &ReliabilityConfig,
) {
    let initial_backoff = Duration::from_secs(reliability.initial_backoff_secs);
    let max_backoff = Duration::from_secs(reliability.max_backoff_secs).max(initial_backoff);
    let mut backoff = initial_backoff;

    loop {
        match poll_once(queue, pipeline).await {
            Ok(_) => {
                backoff = initial_backoff;
                tokio::time::sleep(interval).await;
            }
            Err(e) => {
                tracing::error!(
                    queue = queue.name(),
                    retry_in_secs = backoff.as_secs(),
                    "poll failed: {e}"
                );
                tokio::time::sleep(backoff.max(interval)).await;
                backoff = backoff.saturating_mul(2).min(max_backoff);
            }
        }
    }
}

/// Only setup failures escape to the supervisor.
async fn run_poller(config: Arc<Config>) -> Result<()> {
    let queue = SqsQueue::new(&config.queue, &config.aws)?;
    let pipeline = Pipeline::new(&config, Collaborators::from_config(&config)?)?;
    let interval = Duration::from_millis(config.queue.poll_interval_ms);

    poll_loop(&queue, &pipeline, interval, &config.reliability).await;
    Ok(())
}

/// Run the supervised poll loop until Ctrl-C or until the restart budget
/// is exhausted.
pub async fn run(config: Arc<Config>) -> Result<()> {
    SqsQueue::new(&config.queue, &config.aws)?;

    let poller_config = Arc::clone(&config);
    let mut handle = spawn_component_supervisor("poller", &config.reliability, move || {
        let cfg = Arc::clone(&poller_config);
        async move { run_poller(cfg).await }
    });

    tracing::info!(
        dry_run = config.policy.dry_run,
        skip_untagged = config.policy.skip_untagged,
        report_backend = %config.report.backend,
        "daemon started"
    );

    tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal?;
            tracing::info!("shutdown requested");
            handle.abort();
            let _ = handle.await;
            Ok(())
        }
        _ = &mut handle => bail!("poller stopped after exhausting its restart budget"),
    }
}
