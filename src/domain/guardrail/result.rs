//! Guardrail verdict types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Pipeline stage a guardrail verdict belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardrailLayer {
    Input,
    Output,
}

/// Overall guardrail decision.
///
/// There is no "inconclusive" outcome; every evaluation decides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardrailDecision {
    /// All checks passed
    Passed,
    /// The request or response must not proceed
    Blocked,
    /// Proceed, but with a recorded concern (e.g. redacted PII)
    Flagged,
}

impl GuardrailDecision {
    /// Check if the decision allows the turn to proceed
    pub fn allows_proceeding(&self) -> bool {
        !matches!(self, Self::Blocked)
    }
}

/// Result of one guardrail stage invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardrailResult {
    /// Which stage produced this result
    pub layer: GuardrailLayer,
    /// Overall decision
    pub decision: GuardrailDecision,
    /// Named boolean checks that were evaluated
    pub checks: BTreeMap<String, bool>,
    /// Free-text details keyed by check or concern
    pub details: BTreeMap<String, String>,
    /// When the evaluation ran
    pub timestamp: DateTime<Utc>,
}

impl GuardrailResult {
    /// Create a result with the given verdict and evidence
    pub fn new(
        layer: GuardrailLayer,
        decision: GuardrailDecision,
        checks: BTreeMap<String, bool>,
        details: BTreeMap<String, String>,
    ) -> Self {
        Self {
            layer,
            decision,
            checks,
            details,
            timestamp: Utc::now(),
        }
    }

    /// Look up a named check
    pub fn check(&self, name: &str) -> Option<bool> {
        self.checks.get(name).copied()
    }

    /// Check if the decision is `Blocked`
    pub fn is_blocked(&self) -> bool {
        self.decision == GuardrailDecision::Blocked
    }

    /// Check if the decision is `Flagged`
    pub fn is_flagged(&self) -> bool {
        self.decision == GuardrailDecision::Flagged
    }
}
