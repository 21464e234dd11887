//! The shell policy engine: precompiles a [`Policy`] into an [`Engine`] and
//! evaluates normalized commands against it.

use super::policy::{Policy, Rule};
use crate::errors::EngineBuildError;
use crate::eval_result::{Decision, EvalResult};
use crate::matchers::{domain_in_set, name_glob_match, path_glob_match};
use regex::Regex;

struct CompiledRule {
    rule: Rule,
    command_regex: Option<Regex>,
}

/// A compiled, immutable policy snapshot. Safe to evaluate concurrently from
/// multiple threads without synchronization.
pub struct Engine {
    policy: Policy,
    rules: Vec<CompiledRule>,
    fingerprint: String,
}

impl Engine {
    /// Precompile every rule's regex fields. Fails with the rule id and
    /// field name of the first syntactically invalid regex encountered.
    pub fn new(policy: Policy) -> Result<Self, EngineBuildError> {
        let mut rules = Vec::with_capacity(policy.rules.len());
        for rule in &policy.rules {
            let command_regex = match &rule.match_.command_regex {
                Some(pattern) => Some(Regex::new(pattern).map_err(|source| {
                    EngineBuildError::InvalidRegex {
                        rule_id: rule.id.clone(),
                        field: "command_regex",
                        source,
                    }
                })?),
                None => None,
            };
            rules.push(CompiledRule {
                rule: rule.clone(),
                command_regex,
            });
        }
        let fingerprint = crate::fingerprint::fingerprint(
            &serde_json::to_string(&policy).unwrap_or_default(),
        );
        tracing::info!(fingerprint = %fingerprint, rule_count = rules.len(), "shell policy engine compiled");
        Ok(Self { policy, rules, fingerprint })
    }

    #[must_use]
    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    /// SHA-256 of this engine's compiled policy snapshot, stable across
    /// engines built from identical (base + pack) policy content.
    #[must_use]
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Evaluate a raw command string plus its extracted paths (from
    /// [`crate::normalize::NormalizedCommand::paths`], or a caller-supplied
    /// equivalent) and domains.
    #[must_use]
    pub fn evaluate(&self, command_string: &str, extracted_paths: &[String]) -> EvalResult {
        self.evaluate_with_domains(command_string, extracted_paths, &[])
    }

    #[must_use]
    pub fn evaluate_with_domains(
        &self,
        command_string: &str,
        extracted_paths: &[String],
        domains: &[String],
    ) -> EvalResult {
        let mut result = EvalResult::default_only(self.policy.defaults.decision);

        // Derive the executable and argv for name-based sub-predicates from
        // the raw command string (simple whitespace split — normalization
        // for the true argv lives in `crate::normalize`; this engine only
        // needs the executable token and the raw string for the regex/glob
        // sub-predicates).
        let executable = command_string.split_whitespace().next().unwrap_or("");
        let executable = executable.rsplit('/').next().unwrap_or(executable);

        for compiled in &self.rules {
            if self.rule_matches(compiled, command_string, executable, extracted_paths, domains) {
                result.record(compiled.rule.id.clone(), compiled.rule.decision, compiled.rule.reason.clone());
            }
        }

        metrics::counter!("agentshield_shell_decisions_total", "decision" => result.decision.to_string())
            .increment(1);
        tracing::debug!(decision = %result.decision, executable, "shell command evaluated");

        result
    }

    fn rule_matches(
        &self,
        compiled: &CompiledRule,
        command_string: &str,
        executable: &str,
        extracted_paths: &[String],
        domains: &[String],
    ) -> bool {
        let m = &compiled.rule.match_;

        if let Some(exact) = &m.executable {
            if exact != executable {
                return false;
            }
        }

        if let Some(set) = &m.executable_any {
            if !set.iter().any(|e| e == executable) {
                return false;
            }
        }

        if let Some(re) = &compiled.command_regex {
            if !re.is_match(command_string) {
                return false;
            }
        }

        if let Some(pattern) = &m.argument_glob {
            let any_arg_matches = command_string
                .split_whitespace()
                .any(|arg| name_glob_match(pattern, arg));
            if !any_arg_matches {
                return false;
            }
        }

        if m.protected_path == Some(true) {
            let touches_protected = extracted_paths.iter().any(|p| {
                self.policy
                    .defaults
                    .protected_paths
                    .iter()
                    .any(|glob| path_glob_match(glob, p))
            });
            if !touches_protected {
                return false;
            }
        }

        if let Some(set) = &m.domain_in {
            let any_domain_matches = domains.iter().any(|d| domain_in_set(d, set));
            if !any_domain_matches {
                return false;
            }
        }

        true
    }
}
