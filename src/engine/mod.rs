//! Runs the check battery against one image and folds the results.

mod verdict;

pub use verdict::{Decision, REASON_SEPARATOR, Verdict};

use crate::checks::{Battery, CheckContext, CheckInput, CheckOutcome};
use crate::image::{ImageMetadata, ImageReference};
use crate::probe::ProbeRunner;
use std::sync::Arc;

pub struct Engine {
    battery: Battery,
    runner: Arc<dyn ProbeRunner>,
}

impl Engine {
    pub fn new(battery: Battery, runner: Arc<dyn ProbeRunner>) -> Self {
        Self { battery, runner }
    }

    /// Evaluate an image that is already present locally.
    ///
    /// Never fails: probe errors are logged and handed to the checks, which
    /// treat them as the capability being absent.
    pub async fn evaluate(
        &self,
        reference: &ImageReference,
        metadata: &ImageMetadata,
        dry_run: bool,
    ) -> Verdict {
        let mut context = CheckContext::default();
        let mut outcomes: Vec<(&str, CheckOutcome)> = Vec::new();

        for check in self.battery.checks() {
            let probe = match check.probe(&context) {
                Some(request) => {
                    let result = self.runner.run(&metadata.image_id, &request).await;
                    if let Err(e) = &result {
                        tracing::debug!(
                            check = check.name(),
                            runner = self.runner.name(),
                            probe = %request.display(),
                            "probe failed: {e}"
                        );
                    }
                    Some(result)
                }
                None => None,
            };

            let outcome = check.inspect(&CheckInput {
                metadata,
                probe: probe.as_ref(),
                context: &context,
            });
            for fact in &outcome.facts {
                context.record(fact.clone());
            }
            for finding in &outcome.findings {
                tracing::info!(
                    image = %reference,
                    check = check.name(),
                    severity = %finding.severity,
                    "{}",
                    finding.message
                );
            }
            outcomes.push((check.name(), outcome));
        }

        let history = self.battery.history();
        outcomes.push((
            history.name(),
            CheckOutcome {
                diagnostics: history.format(&metadata.layer_history),
                ..CheckOutcome::default()
            },
        ));

        let verdict = Verdict::fold(outcomes, dry_run);
        tracing::info!(
            image = %reference,
            decision = %verdict.decision,
            dry_run,
            warnings = verdict.warnings.len(),
            "evaluation complete"
        );
        verdict
    }
}
