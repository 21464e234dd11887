//! Decision and evaluation-result types shared by the shell and MCP engines.

use serde::{Deserialize, Serialize};

/// Severity-ordered decision. `Allow < Audit < Block`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Decision {
    Allow,
    Audit,
    Block,
}

impl Decision {
    /// Coarse label for embedding callers that want a severity without
    /// re-deriving it from the `Decision` ordering themselves.
    #[must_use]
    pub fn severity_label(self) -> &'static str {
        match self {
            Decision::Allow => "low",
            Decision::Audit => "elevated",
            Decision::Block => "critical",
        }
    }
}

impl Default for Decision {
    fn default() -> Self {
        Decision::Audit
    }
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Decision::Allow => "ALLOW",
            Decision::Audit => "AUDIT",
            Decision::Block => "BLOCK",
        };
        f.write_str(s)
    }
}

/// The outcome of evaluating a single candidate (command or tool call)
/// against a policy snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvalResult {
    pub decision: Decision,
    pub triggered_rules: Vec<String>,
    pub reasons: Vec<String>,
    pub explanation: String,
}

impl EvalResult {
    /// An `EvalResult` carrying only the policy default, with no rules
    /// triggered.
    #[must_use]
    pub fn default_only(default_decision: Decision) -> Self {
        Self {
            decision: default_decision,
            triggered_rules: Vec::new(),
            reasons: Vec::new(),
            explanation: String::new(),
        }
    }

    /// Record that `rule_id` matched and contributed `decision` with
    /// `reason`. The stored decision becomes the severity-max of everything
    /// recorded so far (including the starting default).
    pub fn record(&mut self, rule_id: impl Into<String>, decision: Decision, reason: impl Into<String>) {
        self.triggered_rules.push(rule_id.into());
        self.reasons.push(reason.into());
        if decision > self.decision {
            self.decision = decision;
        }
        self.rebuild_explanation();
    }

    /// Force the decision to at least `decision`, without recording a rule.
    /// Used for guardrail layers (scanners) that short-circuit to BLOCK
    /// without being expressed as a policy rule.
    pub fn escalate(&mut self, decision: Decision) {
        if decision > self.decision {
            self.decision = decision;
        }
    }

    fn rebuild_explanation(&mut self) {
        self.explanation = self.reasons.join("; ");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_order() {
        assert!(Decision::Allow < Decision::Audit);
        assert!(Decision::Audit < Decision::Block);
    }

    #[test]
    fn record_tracks_severity_max_and_reasons_in_order() {
        let mut result = EvalResult::default_only(Decision::Audit);
        result.record("r1", Decision::Allow, "r1 matched");
        assert_eq!(result.decision, Decision::Audit); // default still dominates
        result.record("r2", Decision::Block, "r2 matched");
        assert_eq!(result.decision, Decision::Block);
        assert_eq!(result.triggered_rules, vec!["r1", "r2"]);
        assert_eq!(result.explanation, "r1 matched; r2 matched");
    }

    #[test]
    fn escalate_never_lowers_decision() {
        let mut result = EvalResult::default_only(Decision::Block);
        result.escalate(Decision::Allow);
        assert_eq!(result.decision, Decision::Block);
    }
}
