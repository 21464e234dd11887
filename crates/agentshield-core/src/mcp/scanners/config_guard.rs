//! A fixed catalogue of security-sensitive file paths that must never be
//! written to (or read from credential-adjacent tools) regardless of
//! whatever policy rules are loaded. This is the last guardrail before a
//! tool call reaches its executor.

use crate::matchers::path_glob_match;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConfigGuardHit {
    pub argument_name: String,
    pub path: String,
    pub pattern: String,
    pub category: String,
    pub reason: String,
}

struct ProtectedPattern {
    glob: &'static str,
    category: &'static str,
    reason: &'static str,
}

const PROTECTED_PATTERNS: &[ProtectedPattern] = &[
    ProtectedPattern {
        glob: "**/.config/agentshield/**",
        category: "agentshield-config",
        reason: "AgentShield's own configuration directory",
    },
    ProtectedPattern {
        glob: "**/.cursor/mcp.json",
        category: "ide-mcp-config",
        reason: "Cursor MCP server configuration",
    },
    ProtectedPattern {
        glob: "**/.vscode/mcp.json",
        category: "ide-mcp-config",
        reason: "VS Code MCP server configuration",
    },
    ProtectedPattern {
        glob: "**/.claude.json",
        category: "ide-mcp-config",
        reason: "Claude Code MCP server configuration",
    },
    ProtectedPattern {
        glob: "**/claude_desktop_config.json",
        category: "ide-mcp-config",
        reason: "Claude Desktop MCP server configuration",
    },
    ProtectedPattern {
        glob: "**/.claude/settings.json",
        category: "ide-hook-config",
        reason: "Claude Code hook configuration",
    },
    ProtectedPattern {
        glob: "**/.claude/settings.local.json",
        category: "ide-hook-config",
        reason: "Claude Code local hook configuration",
    },
    ProtectedPattern {
        glob: "**/.cursor/hooks.json",
        category: "ide-hook-config",
        reason: "Cursor hook configuration",
    },
    ProtectedPattern {
        glob: "**/.husky/**",
        category: "ide-hook-config",
        reason: "Husky git hook script",
    },
    ProtectedPattern {
        glob: "**/.git/hooks/**",
        category: "ide-hook-config",
        reason: "git hook script",
    },
    ProtectedPattern {
        glob: "**/.bashrc",
        category: "shell-config",
        reason: "shell startup file",
    },
    ProtectedPattern {
        glob: "**/.zshrc",
        category: "shell-config",
        reason: "shell startup file",
    },
    ProtectedPattern {
        glob: "**/.profile",
        category: "shell-config",
        reason: "shell startup file",
    },
    ProtectedPattern {
        glob: "**/.bash_profile",
        category: "shell-config",
        reason: "shell startup file",
    },
    ProtectedPattern {
        glob: "**/.npmrc",
        category: "package-manager-config",
        reason: "npm registry/auth configuration",
    },
    ProtectedPattern {
        glob: "**/.pypirc",
        category: "package-manager-config",
        reason: "PyPI upload credentials",
    },
    ProtectedPattern {
        glob: "**/.cargo/credentials.toml",
        category: "package-manager-config",
        reason: "cargo registry credentials",
    },
    ProtectedPattern {
        glob: "**/.gitconfig",
        category: "vcs-config",
        reason: "git global configuration",
    },
    ProtectedPattern {
        glob: "**/.git-credentials",
        category: "vcs-config",
        reason: "stored git credentials",
    },
    ProtectedPattern {
        glob: "**/.ssh/config",
        category: "ssh-config",
        reason: "SSH client configuration",
    },
    ProtectedPattern {
        glob: "**/.ssh/**",
        category: "ssh-config",
        reason: "SSH key material or configuration",
    },
    ProtectedPattern {
        glob: "**/.aws/**",
        category: "cloud-credentials",
        reason: "AWS credentials or configuration",
    },
    ProtectedPattern {
        glob: "**/.kube/config",
        category: "container-config",
        reason: "Kubernetes cluster credentials",
    },
    ProtectedPattern {
        glob: "**/.docker/config.json",
        category: "container-config",
        reason: "Docker registry credentials",
    },
];

/// Recursively extract path-shaped strings from `value` and check each
/// against the protected-path catalogue. `~/` is expanded against `home`.
/// Returns every hit found, in traversal order; an empty result means the
/// call is unaffected by the config guard.
#[must_use]
pub fn check_config_guard(arguments: &serde_json::Value, home: &str) -> Vec<ConfigGuardHit> {
    let mut hits = Vec::new();
    walk(arguments, "$", home, &mut hits);
    hits
}

fn walk(value: &serde_json::Value, path: &str, home: &str, hits: &mut Vec<ConfigGuardHit>) {
    match value {
        serde_json::Value::String(s) => {
            if is_path_shaped(s) {
                let expanded = expand_tilde(s, home);
                for pattern in PROTECTED_PATTERNS {
                    if path_glob_match(pattern.glob, &expanded) {
                        hits.push(ConfigGuardHit {
                            argument_name: path.to_string(),
                            path: expanded.clone(),
                            pattern: pattern.glob.to_string(),
                            category: pattern.category.to_string(),
                            reason: pattern.reason.to_string(),
                        });
                    }
                }
            }
        }
        serde_json::Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                walk(item, &format!("{path}[{i}]"), home, hits);
            }
        }
        serde_json::Value::Object(map) => {
            for (key, item) in map {
                walk(item, &format!("{path}.{key}"), home, hits);
            }
        }
        _ => {}
    }
}

/// The entire string must look like a path: no embedded newlines (a
/// multi-line argument is a file body, not a path), and it must start with
/// `/`, `./`, `../`, `~/`, or `~`, or contain at least one `/`.
fn is_path_shaped(s: &str) -> bool {
    if s.contains('\n') || s.is_empty() {
        return false;
    }
    s.starts_with('/')
        || s.starts_with("./")
        || s.starts_with("../")
        || s.starts_with("~/")
        || s == "~"
        || s.contains('/')
}

fn expand_tilde(path: &str, home: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        format!("{home}/{rest}")
    } else if path == "~" {
        home.to_string()
    } else {
        path.to_string()
    }
}
