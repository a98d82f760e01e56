use super::version::DottedVersion;
use super::{Check, CheckContext, CheckInput, CheckOutcome};
use crate::config::DistroCheckConfig;
use crate::probe::ProbeRequest;
use anyhow::{Result, anyhow};

const RELEASE_PROBE: &str = "if [ -f /etc/alpine-release ]; then echo \"ALPINE:$(cat /etc/alpine-release)\"; \
elif [ -f /etc/debian_version ]; then echo \"DEBIAN:$(cat /etc/debian_version)\"; \
else echo 'UNKNOWN:'; fi";

struct Cutoff {
    family: String,
    minimum: DottedVersion,
    minimum_raw: String,
    suggestion: String,
}

/// Warns about base images built on an unsupported distribution release.
pub struct BaseDistributionCheck {
    cutoffs: Vec<Cutoff>,
}

impl BaseDistributionCheck {
    pub fn new(config: &DistroCheckConfig) -> Result<Self> {
        let cutoffs = config
            .cutoffs
            .iter()
            .map(|cutoff| {
                let minimum = DottedVersion::parse(&cutoff.minimum).ok_or_else(|| {
                    anyhow!(
                        "invalid minimum '{}' for distribution {}",
                        cutoff.minimum,
                        cutoff.family
                    )
                })?;
                Ok(Cutoff {
                    family: cutoff.family.trim().to_ascii_uppercase(),
                    minimum,
                    minimum_raw: cutoff.minimum.trim().to_string(),
                    suggestion: cutoff.suggestion.clone(),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { cutoffs })
    }
}

/// Split `FAMILY:version` as printed by the release probe.
fn parse_release(output: &str) -> Option<(String, String)> {
    let line = output.lines().find(|line| line.contains(':'))?;
    let (family, version) = line.split_once(':')?;
    Some((
        family.trim().to_ascii_uppercase(),
        version.trim().to_string(),
    ))
}

impl Check for BaseDistributionCheck {
    fn name(&self) -> &'static str {
        "base_distribution"
    }

    fn probe(&self, _context: &CheckContext) -> Option<ProbeRequest> {
        Some(ProbeRequest::shell(RELEASE_PROBE))
    }

    fn inspect(&self, input: &CheckInput<'_>) -> CheckOutcome {
        let outcome = CheckOutcome::default();
        let output = match input.probe {
            Some(Ok(output)) => output,
            Some(Err(e)) => return outcome.note(format!("distribution not detected ({e})")),
            None => return outcome,
        };

        let Some((family, version)) = parse_release(&output.output) else {
            return outcome.note("distribution not detected");
        };
        let outcome = outcome.note(format!("{family}:{version}"));

        let Some(cutoff) = self.cutoffs.iter().find(|cutoff| cutoff.family == family) else {
            return outcome;
        };
        let Some(detected) = DottedVersion::parse(&version) else {
            return outcome.note(format!("{family} release '{version}' is not numeric"));
        };
        if detected < cutoff.minimum {
            outcome.warn(format!(
                "Linux distribution is old: {family} {version} is older than {}, consider upgrading the base image to {}",
                cutoff.minimum_raw, cutoff.suggestion
            ))
        } else {
            outcome
        }
    }
}
