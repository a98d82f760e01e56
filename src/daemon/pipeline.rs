use crate::checks::Battery;
use crate::config::{Config, NotifyConfig};
use crate::engine::{Decision, Engine, Verdict};
use crate::error;
use crate::event::{RegistryEvent, Route, Router, SkipReason};
use crate::image::{ImageMetadata, ImageReference, PushContext};
use crate::notify::{Notifier, TeamsNotifier, broadcast, compose};
use crate::probe::{DockerProbeRunner, ProbeRunner};
use crate::queue::QueueMessage;
use crate::registry::{EcrRegistry, Registry};
use crate::report::{ReportInput, ReportRenderer, ReportSink, sink_from_config};
use anyhow::{Context, Result};
use chrono::Utc;
use std::sync::Arc;

/// The adapters a pipeline talks to.
pub struct Collaborators {
    pub registry: Arc<dyn Registry>,
    pub probe: Arc<dyn ProbeRunner>,
    pub report_sink: Arc<dyn ReportSink>,
    pub notifier: Arc<dyn Notifier>,
}

impl Collaborators {
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            registry: Arc::new(EcrRegistry::new(&config.aws, &config.probe)),
            probe: Arc::new(DockerProbeRunner::new(&config.probe)),
            report_sink: sink_from_config(&config.report, &config.aws)?,
            notifier: Arc::new(
                TeamsNotifier::new(&config.notify, config.report.expires_days)
                    .context("building Teams notifier")?,
            ),
        })
    }
}

/// What happened to one queue message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageOutcome {
    Skipped(SkipReason),
    Evaluated {
        decision: Decision,
        deleted: bool,
        report_url: Option<String>,
        notified: usize,
    },
}

/// One evaluation end to end: route, pull, evaluate, report, notify,
/// enforce, clean up.
pub struct Pipeline {
    router: Router,
    engine: Engine,
    renderer: ReportRenderer,
    registry: Arc<dyn Registry>,
    report_sink: Arc<dyn ReportSink>,
    notifier: Arc<dyn Notifier>,
    notify: NotifyConfig,
    dry_run: bool,
}

impl Pipeline {
    pub fn new(config: &Config, collaborators: Collaborators) -> Result<Self> {
        let battery = Battery::from_config(&config.policy, &config.checks)?;
        Ok(Self {
            router: Router::new(&config.registry, &config.policy),
            engine: Engine::new(battery, collaborators.probe),
            renderer: ReportRenderer::new(&config.report.logo_url)?,
            registry: collaborators.registry,
            report_sink: collaborators.report_sink,
            notifier: collaborators.notifier,
            notify: config.notify.clone(),
            dry_run: config.policy.dry_run,
        })
    }

    /// Handle one queue message. Any error is the caller's to log; the
    /// message is acknowledged either way.
    pub async fn handle_message(
        &self,
        message: &QueueMessage,
    ) -> error::Result<MessageOutcome> {
        let event = RegistryEvent::from_json(&message.body)
            .with_context(|| format!("decoding message {}", message.id))?;
        match self.router.route(&event, Utc::now()) {
            Route::Skip { reason } => {
                tracing::debug!(%reason, "event skipped");
                Ok(MessageOutcome::Skipped(reason))
            }
            Route::Evaluate { reference, push } => self.process_image(&reference, &push).await,
        }
    }

    pub async fn process_image(
        &self,
        reference: &ImageReference,
        push: &PushContext,
    ) -> error::Result<MessageOutcome> {
        let credentials = self
            .registry
            .authenticate(&reference.registry_id, &reference.region)
            .await?;
        let metadata = self.registry.pull(reference, &credentials).await?;

        let verdict = self.engine.evaluate(reference, &metadata, self.dry_run).await;
        let report_url = self.publish_report(reference, push, &verdict).await;

        let notification = compose(reference, &verdict);
        let notified = broadcast(
            self.notifier.as_ref(),
            &notification,
            report_url.as_deref(),
            notification.audience.webhooks(&self.notify),
        )
        .await;

        let deleted = if verdict.should_enforce() {
            self.enforce(reference, &metadata).await
        } else {
            false
        };

        if let Err(e) = self.registry.remove_local(&metadata.image_id).await {
            tracing::warn!(image = %reference, "local cleanup failed: {e}");
        }

        Ok(MessageOutcome::Evaluated {
            decision: verdict.decision,
            deleted,
            report_url,
            notified,
        })
    }

    async fn publish_report(
        &self,
        reference: &ImageReference,
        push: &PushContext,
        verdict: &Verdict,
    ) -> Option<String> {
        let input = ReportInput {
            reference,
            push,
            verdict,
            generated_at: Utc::now(),
        };
        let published = match self.renderer.render(&input) {
            Ok(html) => self.report_sink.publish(&html).await,
            Err(e) => Err(e),
        };
        match published {
            Ok(url) => {
                tracing::info!(image = %reference, url = %url, "report available");
                Some(url)
            }
            Err(e) => {
                tracing::error!(image = %reference, sink = self.report_sink.name(), "report not published: {e}");
                None
            }
        }
    }

    /// Delete by tag, then by digest. Returns whether the tag was removed.
    async fn enforce(&self, reference: &ImageReference, metadata: &ImageMetadata) -> bool {
        tracing::warn!(image = %reference, "deleting non-compliant image");
        let tag_deleted = match self.registry.delete_tag(reference).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(image = %reference, "delete by tag failed: {e}");
                false
            }
        };
        match metadata.digest.as_deref() {
            Some(digest) => {
                if let Err(e) = self.registry.delete_digest(reference, digest).await {
                    tracing::error!(image = %reference, digest, "delete by digest failed: {e}");
                }
            }
            None => tracing::warn!(image = %reference, "no repository digest; skipped delete by digest"),
        }
        tag_deleted
    }
}
