use crate::engine::{REASON_SEPARATOR, Verdict};
use crate::error::ReportError;
use crate::image::{ImageReference, PushContext};
use crate::notify::compose;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tera::{Context, Tera};

const TEMPLATE_NAME: &str = "report.html";
const TEMPLATE: &str = include_str!("report.html");

/// Everything the HTML report shows about one evaluation.
pub struct ReportInput<'a> {
    pub reference: &'a ImageReference,
    pub push: &'a PushContext,
    pub verdict: &'a Verdict,
    pub generated_at: DateTime<Utc>,
}

#[derive(Serialize)]
struct CheckSection<'a> {
    name: &'a str,
    lines: &'a [String],
}

/// Tera-backed renderer for the compliance report. The template name ends
/// in `.html`, so every interpolated value is HTML-escaped.
pub struct ReportRenderer {
    tera: Tera,
    logo_url: String,
}

impl ReportRenderer {
    pub fn new(logo_url: &str) -> Result<Self, ReportError> {
        let mut tera = Tera::default();
        tera.add_raw_template(TEMPLATE_NAME, TEMPLATE)
            .map_err(|e| ReportError::Render(e.to_string()))?;
        Ok(Self {
            tera,
            logo_url: logo_url.to_string(),
        })
    }

    pub fn render(&self, input: &ReportInput<'_>) -> Result<String, ReportError> {
        let verdict = input.verdict;
        let notification = compose(input.reference, verdict);
        let checks: Vec<CheckSection<'_>> = verdict
            .diagnostics
            .iter()
            .map(|(name, lines)| CheckSection { name, lines })
            .collect();
        let delete_reasons: Vec<&str> = verdict
            .delete_reason
            .as_deref()
            .map(|reason| reason.split(REASON_SEPARATOR).collect())
            .unwrap_or_default();

        let mut context = Context::new();
        context.insert("title", &notification.title);
        context.insert("color", &notification.color);
        context.insert("summary", &notification.summary);
        context.insert("logo_url", &self.logo_url);
        context.insert("image", &input.reference.pull_ref());
        context.insert("pushed_by", &input.push.pushed_by);
        context.insert("pushed_at", &input.push.pushed_at);
        context.insert("decision", &verdict.decision.to_string());
        context.insert("dry_run", &verdict.dry_run);
        context.insert("delete_reason", &verdict.delete_reason);
        context.insert("delete_reasons", &delete_reasons);
        context.insert("warnings", &verdict.warnings);
        context.insert("checks", &checks);
        context.insert(
            "generated_at",
            &input.generated_at.format("%Y-%m-%d %H:%M:%SZ").to_string(),
        );

        self.tera
            .render(TEMPLATE_NAME, &context)
            .map_err(|e| ReportError::Render(e.to_string()))
    }
}
