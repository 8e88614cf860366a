//! Gate policy deciding whether findings block conversion

use serde::{Deserialize, Serialize};

use crate::finding::{FindingKind, ValidationFinding};

/// Which finding kinds block the convert action.
///
/// The validator only reports; this policy is the single place where
/// findings turn into a hard stop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatePolicy {
    #[serde(default = "all_kinds")]
    pub block_on: Vec<FindingKind>,
}

impl Default for GatePolicy {
    fn default() -> Self {
        Self {
            block_on: all_kinds(),
        }
    }
}

fn all_kinds() -> Vec<FindingKind> {
    vec![FindingKind::EmptyColumn, FindingKind::FormatError]
}

/// Outcome of evaluating findings against a policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Proceed,
    /// Blocking findings, in report order
    Blocked(Vec<ValidationFinding>),
}

impl GateDecision {
    pub fn is_blocked(&self) -> bool {
        matches!(self, GateDecision::Blocked(_))
    }
}

impl GatePolicy {
    /// Findings are shown but never block
    pub fn advisory() -> Self {
        Self {
            block_on: Vec::new(),
        }
    }

    pub fn blocks(&self, finding: &ValidationFinding) -> bool {
        self.block_on.contains(&finding.kind)
    }

    pub fn evaluate(&self, findings: &[ValidationFinding]) -> GateDecision {
        let blocking: Vec<ValidationFinding> = findings
            .iter()
            .filter(|f| self.blocks(f))
            .cloned()
            .collect();

        if blocking.is_empty() {
            GateDecision::Proceed
        } else {
            GateDecision::Blocked(blocking)
        }
    }
}
