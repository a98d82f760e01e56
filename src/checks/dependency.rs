use super::version::loose_semver;
use super::{Check, CheckContext, CheckInput, CheckOutcome};
use crate::config::DependencyCheckConfig;
use crate::probe::ProbeRequest;
use anyhow::{Context, Result};
use regex::Regex;

/// Looks for a bundled JVM agent jar and disqualifies releases that are
/// known to be incompatible with the current platform.
pub struct DependencyVersionCheck {
    artifact: String,
    search_root: String,
    minimum: semver::Version,
    jar_pattern: Regex,
}

impl DependencyVersionCheck {
    pub fn new(config: &DependencyCheckConfig) -> Result<Self> {
        let artifact = config.artifact.trim().to_string();
        // Matched against the file name only, so versioned parent directories are ignored.
        let jar_pattern = Regex::new(&format!(
            r"(?:^|/){}-(\d+)\.(\d+)(?:\.(\d+))?(?:[-.][^/]*)?\.jar$",
            regex::escape(&artifact)
        ))
        .context("invalid dependency artifact name")?;
        Ok(Self {
            minimum: loose_semver(&config.minimum_version)
                .context("invalid checks.dependency.minimum_version")?,
            search_root: config.search_root.clone(),
            artifact,
            jar_pattern,
        })
    }

    fn versions(&self, listing: &str) -> Vec<(semver::Version, String)> {
        let mut found: Vec<_> = listing
            .lines()
            .map(str::trim)
            .filter_map(|line| {
                let caps = self.jar_pattern.captures(line)?;
                let part = |i: usize| {
                    caps.get(i)
                        .and_then(|m| m.as_str().parse::<u64>().ok())
                        .unwrap_or(0)
                };
                Some((semver::Version::new(part(1), part(2), part(3)), line.to_string()))
            })
            .collect();
        found.sort();
        found
    }
}

impl Check for DependencyVersionCheck {
    fn name(&self) -> &'static str {
        "dependency_version"
    }

    fn probe(&self, context: &CheckContext) -> Option<ProbeRequest> {
        context.java()?;
        Some(ProbeRequest::shell(format!(
            "find {} -xdev -name '{}-*.jar' 2>/dev/null; true",
            self.search_root, self.artifact
        )))
    }

    fn inspect(&self, input: &CheckInput<'_>) -> CheckOutcome {
        let mut outcome = CheckOutcome::default();
        let output = match input.probe {
            Some(Ok(output)) => output,
            Some(Err(e)) => return outcome.note(format!("jar search failed ({e})")),
            None => return outcome,
        };

        let versions = self.versions(&output.output);
        if versions.is_empty() {
            return outcome.note(format!("{} not bundled", self.artifact));
        }
        for (version, path) in &versions {
            outcome = outcome.note(format!("{path} ({version})"));
        }
        if let Some((lowest, _)) = versions.first().filter(|(v, _)| *v < self.minimum) {
            outcome = outcome.disqualify(format!(
                "{} {lowest} is older than the minimum supported {}",
                self.artifact, self.minimum
            ));
        }
        outcome
    }
}
