use crate::checks::{CheckOutcome, Severity};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Separator between entries of the delete-reason chain.
pub const REASON_SEPARATOR: &str = "; ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Decision {
    Accept,
    Warn,
    Delete,
}

/// Outcome of one image evaluation.
///
/// `decision` is `Delete` exactly when a disqualifying finding was produced.
/// `dry_run` is advisory: it never changes `decision` or `delete_reason`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub decision: Decision,
    pub dry_run: bool,
    /// Disqualifying reasons, most recent first.
    pub delete_reason: Option<String>,
    pub warnings: Vec<String>,
    pub diagnostics: BTreeMap<String, Vec<String>>,
}

impl Verdict {
    /// Fold per-check outcomes, in battery order, into a verdict.
    pub fn fold<'a, I>(outcomes: I, dry_run: bool) -> Self
    where
        I: IntoIterator<Item = (&'a str, CheckOutcome)>,
    {
        let mut reasons: Vec<String> = Vec::new();
        let mut warnings = Vec::new();
        let mut diagnostics = BTreeMap::new();

        for (name, outcome) in outcomes {
            for finding in outcome.findings {
                match finding.severity {
                    Severity::Disqualifying => reasons.insert(0, finding.message),
                    Severity::Warning => warnings.push(finding.message),
                }
            }
            if !outcome.diagnostics.is_empty() {
                diagnostics
                    .entry(name.to_string())
                    .or_insert_with(Vec::new)
                    .extend(outcome.diagnostics);
            }
        }

        let decision = if !reasons.is_empty() {
            Decision::Delete
        } else if !warnings.is_empty() {
            Decision::Warn
        } else {
            Decision::Accept
        };

        Self {
            decision,
            dry_run,
            delete_reason: (!reasons.is_empty()).then(|| reasons.join(REASON_SEPARATOR)),
            warnings,
            diagnostics,
        }
    }

    /// Whether the caller should actually delete the image.
    pub fn should_enforce(&self) -> bool {
        self.decision == Decision::Delete && !self.dry_run
    }
}
