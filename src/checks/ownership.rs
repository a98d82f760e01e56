use super::{Check, CheckContext, CheckInput, CheckOutcome};
use crate::probe::ProbeRequest;

/// Every image must name the team that owns it.
pub struct OwnershipLabelCheck {
    label: String,
}

impl OwnershipLabelCheck {
    pub fn new(label: &str) -> Self {
        Self {
            label: label.trim().to_string(),
        }
    }
}

impl Check for OwnershipLabelCheck {
    fn name(&self) -> &'static str {
        "ownership_label"
    }

    fn probe(&self, _context: &CheckContext) -> Option<ProbeRequest> {
        None
    }

    fn inspect(&self, input: &CheckInput<'_>) -> CheckOutcome {
        match input.metadata.label(&self.label) {
            Some(owner) => CheckOutcome::default().note(format!("{}={owner}", self.label)),
            None => CheckOutcome::default()
                .disqualify(format!("Missing required label '{}'", self.label)),
        }
    }
}
