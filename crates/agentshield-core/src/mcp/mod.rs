//! The MCP tool-call and resource-read policy engine, plus the guardrail
//! scanners that run ahead of it: poisoning detection over tool
//! descriptions, exfiltration scanning over tool-call results, and a
//! config-file protection catalogue.

pub mod engine;
pub mod packs;
pub mod policy;
pub mod scanners;

pub use engine::Engine;
pub use packs::{load_packs, McpPack};
pub use policy::{McpDefaults, McpPolicy, McpRule, McpRuleMatch, ResourceRule, ValueLimit};
pub use scanners::{
    check_config_guard, redact, scan_tool_call_content, scan_tool_description, ConfigGuardHit,
    ExfiltrationFinding, PoisoningFinding,
};

use serde::{Deserialize, Serialize};

/// A tool as advertised by an MCP server's `tools/list` response, the
/// shape [`scanners::scan_tool_description`] inspects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "inputSchema", default)]
    pub input_schema: serde_json::Value,
}
