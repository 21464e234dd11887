//! JSON-RPC 2.0 message parsing and classification, shared by both the
//! stdio and HTTP transports.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub mod error_codes {
    pub const PARSE_ERROR: i32 = -32700;
    pub const INTERNAL_ERROR: i32 = -32603;
    pub const SECURITY_BLOCK: i32 = -32000;
}

/// A single parsed JSON-RPC line/body, classified into the shape the proxy
/// cares about. `Other` covers every request/response/notification whose
/// method or shape is not of direct interest — it is always forwarded
/// verbatim.
#[derive(Debug, Clone)]
pub enum MCPMessage {
    ToolCallRequest {
        id: Value,
        tool_name: String,
        arguments: Value,
        raw: Value,
    },
    ResourceReadRequest {
        id: Value,
        uri: String,
        raw: Value,
    },
    ToolsListResponse {
        raw: Value,
    },
    Other {
        raw: Value,
    },
}

#[derive(Debug, Deserialize)]
struct RawMessage {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    method: Option<String>,
    #[serde(default)]
    params: Value,
    #[serde(default)]
    result: Value,
}

/// Parse one JSON-RPC line/body and classify it. A `tools/call` request
/// whose `params` don't contain a string `name` falls back to `Other`
/// rather than failing the whole message: it's forwarded untouched.
pub fn classify(raw: Value) -> MCPMessage {
    let Ok(parsed) = serde_json::from_value::<RawMessage>(raw.clone()) else {
        return MCPMessage::Other { raw };
    };

    match parsed.method.as_deref() {
        Some("tools/call") => {
            let Some(id) = parsed.id.clone() else {
                return MCPMessage::Other { raw };
            };
            let Some(tool_name) = parsed.params.get("name").and_then(|n| n.as_str()) else {
                return MCPMessage::Other { raw };
            };
            let arguments = parsed
                .params
                .get("arguments")
                .cloned()
                .unwrap_or(Value::Null);
            MCPMessage::ToolCallRequest {
                id,
                tool_name: tool_name.to_string(),
                arguments,
                raw,
            }
        }
        Some("resources/read") => {
            let Some(id) = parsed.id.clone() else {
                return MCPMessage::Other { raw };
            };
            let Some(uri) = parsed.params.get("uri").and_then(|u| u.as_str()) else {
                return MCPMessage::Other { raw };
            };
            MCPMessage::ResourceReadRequest {
                id,
                uri: uri.to_string(),
                raw,
            }
        }
        // A response carries no `method`; a tools/list response is
        // recognized by shape: `result.tools` is an array.
        None if parsed.result.get("tools").is_some_and(Value::is_array) => {
            MCPMessage::ToolsListResponse { raw }
        }
        _ => MCPMessage::Other { raw },
    }
}

/// Build the JSON-RPC error response synthesized in place of a forwarded
/// request when the policy pipeline returns BLOCK. Carries the original
/// request's `id` unchanged so the client-side correlator accepts it.
#[derive(Debug, Serialize)]
pub struct JsonRpcErrorResponse {
    pub jsonrpc: &'static str,
    pub id: Value,
    pub error: JsonRpcErrorBody,
}

#[derive(Debug, Serialize)]
pub struct JsonRpcErrorBody {
    pub code: i32,
    pub message: String,
    pub data: JsonRpcErrorData,
}

#[derive(Debug, Serialize)]
pub struct JsonRpcErrorData {
    pub triggered_rules: Vec<String>,
}

pub fn blocked_response(id: Value, reasons: &[String], triggered_rules: Vec<String>) -> Value {
    let message = if reasons.is_empty() {
        "BLOCKED by AgentShield".to_string()
    } else {
        format!("BLOCKED by AgentShield: {}", reasons.join("; "))
    };
    serde_json::to_value(JsonRpcErrorResponse {
        jsonrpc: "2.0",
        id,
        error: JsonRpcErrorBody {
            code: error_codes::SECURITY_BLOCK,
            message,
            data: JsonRpcErrorData { triggered_rules },
        },
    })
    .expect("JsonRpcErrorResponse always serializes")
}

/// Build the JSON-RPC error response synthesized when evaluating a request
/// against the policy engine panics. The pump must survive this: the
/// affected request gets an error response carrying its own `id`, every
/// other in-flight or subsequent message is unaffected.
pub fn internal_error_response(id: Value) -> Value {
    serde_json::to_value(JsonRpcErrorResponse {
        jsonrpc: "2.0",
        id,
        error: JsonRpcErrorBody {
            code: error_codes::INTERNAL_ERROR,
            message: "AgentShield policy evaluation failed unexpectedly".to_string(),
            data: JsonRpcErrorData {
                triggered_rules: Vec::new(),
            },
        },
    })
    .expect("JsonRpcErrorResponse always serializes")
}

/// Drop any tool from a `tools/list` response whose name is in
/// `poisoned_names`, preserving the order of the rest. Returns the number
/// of tools dropped.
pub fn filter_poisoned_tools(raw: &mut Value, poisoned_names: &std::collections::HashSet<String>) -> usize {
    let Some(tools) = raw
        .get_mut("result")
        .and_then(|r| r.get_mut("tools"))
        .and_then(Value::as_array_mut)
    else {
        return 0;
    };
    let before = tools.len();
    tools.retain(|tool| {
        let name = tool.get("name").and_then(Value::as_str).unwrap_or("");
        !poisoned_names.contains(name)
    });
    before - tools.len()
}
