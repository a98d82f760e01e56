//! The compliance check battery.
//!
//! Each check optionally asks for one probe, then inspects the image
//! metadata and the probe result without side effects. Checks that depend
//! on an earlier one (the JVM checks) read the facts it published through
//! [`CheckContext`] instead of sharing flags.

mod dependency;
mod distro;
pub mod history;
mod java;
mod node;
mod ownership;
mod packages;
pub mod version;

pub use dependency::DependencyVersionCheck;
pub use distro::BaseDistributionCheck;
pub use history::LayerHistoryFormatter;
pub use java::{HeapSizingCheck, JavaRuntimeCheck};
pub use node::NodeRuntimeCheck;
pub use ownership::OwnershipLabelCheck;
pub use packages::PackageFreshnessCheck;

use crate::config::{ChecksConfig, PolicyConfig};
use crate::image::ImageMetadata;
use crate::probe::{ProbeRequest, ProbeResult};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use version::JavaVersion;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Severity {
    Warning,
    /// Mandates deletion of the image.
    Disqualifying,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub severity: Severity,
    pub message: String,
}

impl Finding {
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
        }
    }

    pub fn disqualifying(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Disqualifying,
            message: message.into(),
        }
    }
}

/// Facts a check publishes for the checks after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fact {
    JavaRuntime { version: JavaVersion, raw: String },
}

/// Accumulated facts from the checks that already ran.
#[derive(Debug, Clone, Default)]
pub struct CheckContext {
    java: Option<(JavaVersion, String)>,
}

impl CheckContext {
    pub fn record(&mut self, fact: Fact) {
        match fact {
            Fact::JavaRuntime { version, raw } => self.java = Some((version, raw)),
        }
    }

    pub fn java(&self) -> Option<&JavaVersion> {
        self.java.as_ref().map(|(version, _)| version)
    }

    /// Version string as the JVM reported it.
    pub fn java_raw(&self) -> Option<&str> {
        self.java.as_ref().map(|(_, raw)| raw.as_str())
    }
}

pub struct CheckInput<'a> {
    pub metadata: &'a ImageMetadata,
    /// `None` when the check requested no probe.
    pub probe: Option<&'a ProbeResult>,
    pub context: &'a CheckContext,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckOutcome {
    pub findings: Vec<Finding>,
    pub diagnostics: Vec<String>,
    pub facts: Vec<Fact>,
}

impl CheckOutcome {
    pub fn warn(mut self, message: impl Into<String>) -> Self {
        self.findings.push(Finding::warning(message));
        self
    }

    pub fn disqualify(mut self, message: impl Into<String>) -> Self {
        self.findings.push(Finding::disqualifying(message));
        self
    }

    pub fn note(mut self, line: impl Into<String>) -> Self {
        self.diagnostics.push(line.into());
        self
    }

    pub fn fact(mut self, fact: Fact) -> Self {
        self.facts.push(fact);
        self
    }
}

pub trait Check: Send + Sync {
    /// Stable identifier, used as the diagnostics key.
    fn name(&self) -> &'static str;

    /// Probe to run before `inspect`, given what earlier checks found.
    fn probe(&self, context: &CheckContext) -> Option<ProbeRequest>;

    fn inspect(&self, input: &CheckInput<'_>) -> CheckOutcome;
}

/// The fixed, ordered set of checks plus the layer-history formatter.
pub struct Battery {
    checks: Vec<Box<dyn Check>>,
    history: LayerHistoryFormatter,
}

impl Battery {
    /// Build the battery in evaluation order, validating every threshold.
    pub fn from_config(policy: &PolicyConfig, config: &ChecksConfig) -> Result<Self> {
        let checks: Vec<Box<dyn Check>> = vec![
            Box::new(OwnershipLabelCheck::new(&policy.owner_label)),
            Box::new(JavaRuntimeCheck::new(&config.java)?),
            Box::new(HeapSizingCheck::new(&config.java)),
            Box::new(DependencyVersionCheck::new(&config.dependency)?),
            Box::new(NodeRuntimeCheck::new(&config.node)),
            Box::new(BaseDistributionCheck::new(&config.distro)?),
            Box::new(PackageFreshnessCheck::new(&config.packages)?),
        ];
        Ok(Self {
            checks,
            history: LayerHistoryFormatter::new(config.history.wrap_width),
        })
    }

    pub fn checks(&self) -> impl Iterator<Item = &dyn Check> {
        self.checks.iter().map(|check| &**check)
    }

    pub fn history(&self) -> &LayerHistoryFormatter {
        &self.history
    }
}
