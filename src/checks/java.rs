use super::version::{JavaVersion, java_threshold};
use super::{Check, CheckContext, CheckInput, CheckOutcome, Fact};
use crate::config::JavaCheckConfig;
use crate::probe::ProbeRequest;
use anyhow::Result;

/// Detects the JVM and warns when it predates container support.
pub struct JavaRuntimeCheck {
    minimum: JavaVersion,
    minimum_raw: String,
}

impl JavaRuntimeCheck {
    pub fn new(config: &JavaCheckConfig) -> Result<Self> {
        Ok(Self {
            minimum: java_threshold(&config.minimum_version)?,
            minimum_raw: config.minimum_version.trim().to_string(),
        })
    }
}

impl Check for JavaRuntimeCheck {
    fn name(&self) -> &'static str {
        "java_runtime"
    }

    fn probe(&self, _context: &CheckContext) -> Option<ProbeRequest> {
        Some(ProbeRequest::new("java", ["-version"]))
    }

    fn inspect(&self, input: &CheckInput<'_>) -> CheckOutcome {
        let outcome = CheckOutcome::default();
        let output = match input.probe {
            Some(Ok(output)) => output,
            Some(Err(e)) => return outcome.note(format!("no java runtime detected ({e})")),
            None => return outcome,
        };

        let Some((version, raw)) = JavaVersion::from_version_output(&output.output) else {
            return outcome.note(format!(
                "java answered but its version was not recognized: {}",
                output.output.lines().next().unwrap_or_default()
            ));
        };

        let mut outcome = outcome.note(format!("java {raw}"));
        if version < self.minimum {
            outcome = outcome.warn(format!(
                "Java runtime {raw} is older than the minimum supported {}",
                self.minimum_raw
            ));
        }
        outcome.fact(Fact::JavaRuntime { version, raw })
    }
}

/// Checks the JVM accepts the container-aware heap flag.
pub struct HeapSizingCheck {
    flag: String,
}

impl HeapSizingCheck {
    pub fn new(config: &JavaCheckConfig) -> Self {
        Self {
            flag: config.heap_flag.trim().to_string(),
        }
    }
}

impl Check for HeapSizingCheck {
    fn name(&self) -> &'static str {
        "java_heap_sizing"
    }

    fn probe(&self, context: &CheckContext) -> Option<ProbeRequest> {
        context.java()?;
        Some(ProbeRequest::new(
            "java",
            [
                "-XX:+UnlockExperimentalVMOptions".to_string(),
                self.flag.clone(),
                "-version".to_string(),
            ],
        ))
    }

    fn inspect(&self, input: &CheckInput<'_>) -> CheckOutcome {
        let outcome = CheckOutcome::default();
        match input.probe {
            Some(Ok(_)) => outcome.note(format!("{} accepted", self.flag)),
            Some(Err(e)) => {
                let raw = input.context.java_raw().unwrap_or("unknown");
                outcome
                    .warn(format!(
                        "Java runtime {raw} does not support {}; heap size will ignore container memory limits",
                        self.flag
                    ))
                    .note(e.to_string())
            }
            None => outcome,
        }
    }
}
