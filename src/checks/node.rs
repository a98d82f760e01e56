use super::{Check, CheckContext, CheckInput, CheckOutcome};
use crate::config::NodeCheckConfig;
use crate::probe::ProbeRequest;
use regex::Regex;
use std::sync::LazyLock;

static NODE_MAJOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^v?(\d+)\.").expect("static regex is valid"));

pub struct NodeRuntimeCheck {
    eol_major_max: u64,
}

impl NodeRuntimeCheck {
    pub fn new(config: &NodeCheckConfig) -> Self {
        Self {
            eol_major_max: config.eol_major_max,
        }
    }
}

impl Check for NodeRuntimeCheck {
    fn name(&self) -> &'static str {
        "node_runtime"
    }

    fn probe(&self, _context: &CheckContext) -> Option<ProbeRequest> {
        Some(ProbeRequest::new("node", ["--version"]))
    }

    fn inspect(&self, input: &CheckInput<'_>) -> CheckOutcome {
        let outcome = CheckOutcome::default();
        let output = match input.probe {
            Some(Ok(output)) => output.output.trim(),
            Some(Err(e)) => return outcome.note(format!("no node runtime detected ({e})")),
            None => return outcome,
        };

        let Some(major) = NODE_MAJOR
            .captures(output)
            .and_then(|caps| caps[1].parse::<u64>().ok())
        else {
            return outcome.note(format!("unrecognized node version '{output}'"));
        };

        let outcome = outcome.note(format!("node {output}"));
        if major <= self.eol_major_max {
            outcome.warn(format!(
                "Node.js {output} has reached end-of-life; upgrade to a supported release"
            ))
        } else {
            outcome
        }
    }
}
