//! Shell policy document shape: an ordered list of [`Rule`]s plus
//! [`Defaults`] and [`Network`] blocks, loaded from YAML.

use crate::eval_result::Decision;
use crate::errors::PolicyLoadError;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Policy {
    #[serde(default)]
    pub version: String,

    #[serde(default)]
    pub defaults: Defaults,

    #[serde(default)]
    pub network: Network,

    #[serde(default)]
    pub rules: Vec<Rule>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Defaults {
    #[serde(default = "Decision::default")]
    pub decision: Decision,

    #[serde(default)]
    pub protected_paths: Vec<String>,

    #[serde(default)]
    pub log_redaction: bool,

    #[serde(default)]
    pub non_interactive: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            decision: Decision::Audit,
            protected_paths: Vec::new(),
            log_redaction: false,
            non_interactive: String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Network {
    #[serde(default)]
    pub allow_domains: Vec<String>,
}

/// A single ordered policy rule. The predicate is the conjunction of every
/// `Some` field in `match_`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    pub id: String,

    #[serde(rename = "match")]
    pub match_: RuleMatch,

    pub decision: Decision,

    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleMatch {
    /// Exact executable name.
    #[serde(default)]
    pub executable: Option<String>,

    /// Executable-name-in-set.
    #[serde(default)]
    pub executable_any: Option<Vec<String>>,

    /// Regex on the full, raw command string.
    #[serde(default)]
    pub command_regex: Option<String>,

    /// Glob over any single argument.
    #[serde(default)]
    pub argument_glob: Option<String>,

    /// If true, satisfied when any extracted path matches a protected-path
    /// glob from `Defaults.protected_paths`.
    #[serde(default)]
    pub protected_path: Option<bool>,

    /// Satisfied when any extracted domain is in this set.
    #[serde(default)]
    pub domain_in: Option<Vec<String>>,
}

impl Policy {
    /// Load a policy from `path`. A missing file is not an error: it yields
    /// [`Policy::default_policy`].
    pub fn load(path: &Path) -> Result<Self, PolicyLoadError> {
        if !path.exists() {
            return Ok(Self::default_policy());
        }
        let content = std::fs::read_to_string(path).map_err(|source| PolicyLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&content, path)
    }

    pub fn from_yaml_str(content: &str, path: &Path) -> Result<Self, PolicyLoadError> {
        serde_yaml::from_str(content).map_err(|source| PolicyLoadError::Yaml {
            path: path.to_path_buf(),
            source,
        })
    }

    /// The built-in default policy: AUDIT by default, a handful of
    /// destructive/exfiltration rules BLOCKed, common readonly commands
    /// ALLOWed, and the well-known sensitive filesystem globs protected.
    #[must_use]
    pub fn default_policy() -> Self {
        Self {
            version: "1".to_string(),
            defaults: Defaults {
                decision: Decision::Audit,
                protected_paths: vec![
                    "/".to_string(),
                    "/etc/shadow".to_string(),
                    "/etc/passwd".to_string(),
                    "**/.ssh/**".to_string(),
                    "**/.aws/**".to_string(),
                    "**/.gnupg/**".to_string(),
                ],
                log_redaction: true,
                non_interactive: "audit".to_string(),
            },
            network: Network {
                allow_domains: Vec::new(),
            },
            rules: vec![
                Rule {
                    id: "deny-destructive-root".to_string(),
                    match_: RuleMatch {
                        executable: Some("rm".to_string()),
                        protected_path: Some(true),
                        ..RuleMatch::default()
                    },
                    decision: Decision::Block,
                    reason: "destructive deletion of a protected path".to_string(),
                },
                Rule {
                    id: "deny-pipe-to-shell".to_string(),
                    match_: RuleMatch {
                        command_regex: Some(r"\|\s*(sh|bash|zsh)\b".to_string()),
                        ..RuleMatch::default()
                    },
                    decision: Decision::Block,
                    reason: "piping remote content directly into a shell".to_string(),
                },
                Rule {
                    id: "allow-safe-readonly".to_string(),
                    match_: RuleMatch {
                        executable_any: Some(vec![
                            "ls".to_string(),
                            "cat".to_string(),
                            "pwd".to_string(),
                            "echo".to_string(),
                            "grep".to_string(),
                        ]),
                        ..RuleMatch::default()
                    },
                    decision: Decision::Allow,
                    reason: "read-only command".to_string(),
                },
                Rule {
                    id: "audit-package-installs".to_string(),
                    match_: RuleMatch {
                        executable_any: Some(vec![
                            "npm".to_string(),
                            "pip".to_string(),
                            "pip3".to_string(),
                            "cargo".to_string(),
                            "brew".to_string(),
                            "apt".to_string(),
                            "apt-get".to_string(),
                        ]),
                        ..RuleMatch::default()
                    },
                    decision: Decision::Audit,
                    reason: "package manager invocation".to_string(),
                },
            ],
        }
    }
}
