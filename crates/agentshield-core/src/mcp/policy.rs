//! MCP policy document shape: `blocked_tools`, tool-call `rules`,
//! `value_limits`, and resource `resource_rules`.

use crate::errors::PolicyLoadError;
use crate::eval_result::Decision;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpPolicy {
    #[serde(default)]
    pub defaults: McpDefaults,

    #[serde(default)]
    pub blocked_tools: Vec<String>,

    #[serde(default)]
    pub blocked_resources: Vec<String>,

    #[serde(default)]
    pub rules: Vec<McpRule>,

    #[serde(default)]
    pub value_limits: Vec<ValueLimit>,

    #[serde(default)]
    pub resource_rules: Vec<ResourceRule>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpDefaults {
    #[serde(default = "Decision::default")]
    pub decision: Decision,
}

impl Default for McpDefaults {
    fn default() -> Self {
        Self {
            decision: Decision::Audit,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpRule {
    pub id: String,

    #[serde(rename = "match")]
    pub match_: McpRuleMatch,

    pub decision: Decision,

    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct McpRuleMatch {
    #[serde(default)]
    pub tool_name: Option<String>,

    #[serde(default)]
    pub tool_name_any: Option<Vec<String>>,

    #[serde(default)]
    pub tool_name_regex: Option<String>,

    /// Argument name -> glob over its string value. Disjunction not
    /// applicable here: every entry must match (conjunction), and a
    /// missing/non-string argument means the rule does not trigger.
    #[serde(default)]
    pub argument_patterns: BTreeMap<String, String>,

    /// Argument name -> required substring.
    #[serde(default)]
    pub argument_contains: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValueLimit {
    pub id: String,
    pub tool_name_regex: String,
    pub argument: String,
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
    pub decision: Decision,
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceRule {
    pub id: String,
    #[serde(default)]
    pub scheme: Option<String>,
    #[serde(default)]
    pub uri_pattern: Option<String>,
    pub decision: Decision,
    #[serde(default)]
    pub reason: String,
}

impl Default for McpPolicy {
    fn default() -> Self {
        Self::default_policy()
    }
}

impl McpPolicy {
    pub fn load(path: &Path) -> Result<Self, PolicyLoadError> {
        if !path.exists() {
            return Ok(Self::default_policy());
        }
        let content = std::fs::read_to_string(path).map_err(|source| PolicyLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&content).map_err(|source| PolicyLoadError::Yaml {
            path: path.to_path_buf(),
            source,
        })
    }

    /// The built-in default MCP policy: a curated `blocked_tools` set for
    /// obviously dangerous tool names, and a `read_file`-style rule
    /// blocking reads of SSH/credential paths via `argument_patterns`.
    #[must_use]
    pub fn default_policy() -> Self {
        Self {
            defaults: McpDefaults {
                decision: Decision::Audit,
            },
            blocked_tools: vec![
                "execute_command".to_string(),
                "run_shell*".to_string(),
                "eval_code".to_string(),
            ],
            blocked_resources: Vec::new(),
            rules: vec![McpRule {
                id: "deny-ssh-key-read".to_string(),
                match_: McpRuleMatch {
                    tool_name_any: Some(vec![
                        "read_file".to_string(),
                        "get_file".to_string(),
                        "cat_file".to_string(),
                    ]),
                    argument_patterns: BTreeMap::from([(
                        "path".to_string(),
                        "**/.ssh/**".to_string(),
                    )]),
                    ..Default::default()
                },
                decision: Decision::Block,
                reason: "reading an SSH private key path".to_string(),
            }],
            value_limits: Vec::new(),
            resource_rules: Vec::new(),
        }
    }
}
