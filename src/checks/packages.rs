use super::{Check, CheckContext, CheckInput, CheckOutcome};
use crate::config::PackageCheckConfig;
use crate::probe::ProbeRequest;
use anyhow::{Context, Result, bail};
use regex::Regex;

/// Lists installed packages with whichever package manager the image has.
/// Needs network so `apk` can refresh its index.
const PACKAGE_LISTING: &str = "if command -v apk >/dev/null 2>&1; then apk update -q >/dev/null 2>&1; apk info -v 2>/dev/null; \
elif command -v dpkg-query >/dev/null 2>&1; then dpkg-query -W -f='${Package}=${Version}\\n' 2>/dev/null; fi; true";

/// Disqualifies images carrying a Java runtime package below the patch
/// level that fixed known container issues.
pub struct PackageFreshnessCheck {
    pattern: Regex,
    minimum_patch: u64,
}

impl PackageFreshnessCheck {
    pub fn new(config: &PackageCheckConfig) -> Result<Self> {
        let pattern = Regex::new(&config.package_pattern)
            .context("invalid checks.packages.package_pattern")?;
        if pattern.captures_len() < 2 {
            bail!("checks.packages.package_pattern must capture the patch level");
        }
        Ok(Self {
            pattern,
            minimum_patch: config.minimum_patch,
        })
    }
}

impl Check for PackageFreshnessCheck {
    fn name(&self) -> &'static str {
        "package_freshness"
    }

    fn probe(&self, _context: &CheckContext) -> Option<ProbeRequest> {
        Some(ProbeRequest::shell(PACKAGE_LISTING).with_network())
    }

    fn inspect(&self, input: &CheckInput<'_>) -> CheckOutcome {
        let mut outcome = CheckOutcome::default();
        let output = match input.probe {
            Some(Ok(output)) => output,
            Some(Err(e)) => return outcome.note(format!("package listing failed ({e})")),
            None => return outcome,
        };

        let mut flagged = false;
        for line in output.output.lines().map(str::trim) {
            let Some(patch) = self
                .pattern
                .captures(line)
                .and_then(|caps| caps.get(1))
                .and_then(|m| m.as_str().parse::<u64>().ok())
            else {
                continue;
            };
            outcome = outcome.note(line.to_string());
            if !flagged && patch < self.minimum_patch {
                flagged = true;
                outcome = outcome.disqualify(format!(
                    "Package {line} is below the minimum patch level {}",
                    self.minimum_patch
                ));
            }
        }
        outcome
    }
}
