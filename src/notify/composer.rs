use crate::config::NotifyConfig;
use crate::engine::{Decision, Verdict};
use crate::image::ImageReference;
use serde::{Deserialize, Serialize};

/// Severity palette shared by notifications and the HTML report.
pub mod palette {
    pub const OK: &str = "#98ef8d";
    pub const WARN: &str = "#ffd000";
    pub const CONCERN: &str = "#ff7400";
    pub const CRITICAL: &str = "#ff003e";
}

pub const SUMMARY_PASSED: &str = "Passed Compliance Tests";
pub const SUMMARY_WARNINGS: &str = "Passed Compliance Tests with Warnings";
pub const SUMMARY_FAILED: &str = "Failed Compliance Tests";
pub const SUMMARY_DELETED: &str = "Failed Compliance Tests => Image Deleted";

/// Which configured webhook list receives a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Audience {
    Delete,
    Warning,
    Ok,
}

impl Audience {
    pub fn webhooks(self, config: &NotifyConfig) -> &[String] {
        match self {
            Self::Delete => &config.delete_webhooks,
            Self::Warning => &config.warning_webhooks,
            Self::Ok => &config.ok_webhooks,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub color: String,
    pub summary: String,
    /// Markdown.
    pub body: String,
    pub audience: Audience,
}

/// Map a verdict onto the notification the owning teams receive.
///
/// A dry-run delete uses the concern color and goes to the warning
/// audience; the delete webhooks only hear about images actually removed.
/// Earlier deployments sent it in the warn color to the delete webhooks.
pub fn compose(reference: &ImageReference, verdict: &Verdict) -> Notification {
    let (color, summary, audience) = match (verdict.decision, verdict.dry_run) {
        (Decision::Accept, _) => (palette::OK, SUMMARY_PASSED, Audience::Ok),
        (Decision::Warn, _) => (palette::WARN, SUMMARY_WARNINGS, Audience::Warning),
        (Decision::Delete, true) => (palette::CONCERN, SUMMARY_FAILED, Audience::Warning),
        (Decision::Delete, false) => (palette::CRITICAL, SUMMARY_DELETED, Audience::Delete),
    };

    let mut body = match verdict.decision {
        Decision::Accept => format!("*{summary}*"),
        Decision::Warn => format!("**{summary}**"),
        Decision::Delete => format!("**{SUMMARY_FAILED}**"),
    };

    let mut bullets = Vec::new();
    if verdict.should_enforce() {
        bullets.push("Image Deleted".to_string());
    }
    bullets.extend(verdict.delete_reason.iter().cloned());
    bullets.extend(verdict.warnings.iter().cloned());
    if !bullets.is_empty() {
        body.push_str("\n\n");
        body.push_str(
            &bullets
                .iter()
                .map(|bullet| format!(" * {bullet}"))
                .collect::<Vec<_>>()
                .join("\n"),
        );
    }

    Notification {
        title: format!("⌘ {}:{}", reference.repository, reference.tag),
        color: color.to_string(),
        summary: summary.to_string(),
        body,
        audience,
    }
}
