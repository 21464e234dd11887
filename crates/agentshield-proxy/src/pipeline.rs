//! The message-handling core shared by the stdio and HTTP transports:
//! classify one JSON-RPC value, consult the MCP engine (for requests of
//! interest) or the poisoning scanner (for `tools/list` responses), and
//! return what should actually be written to the peer.

use crate::audit::{now_rfc3339, AuditEntry, AuditSink};
use crate::message::{blocked_response, classify, filter_poisoned_tools, internal_error_response, MCPMessage};
use agentshield_core::mcp::{redact, scan_tool_description, Engine as McpEngine, ToolDefinition};
use serde_json::Value;
use std::collections::HashSet;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Evaluate one incoming request (or forward anything else untouched).
/// `source` tags the audit entries this session produces
/// (`"mcp-proxy"` for stdio, `"mcp-http-proxy"` for HTTP).
///
/// Engine evaluation runs behind [`catch_unwind`]: a panic inside the
/// policy engine or a scanner must not tear down the pump. It is converted
/// into a JSON-RPC internal-error response carrying the offending request's
/// own `id`; every other message in flight is unaffected.
pub fn process_incoming(raw: Value, engine: &McpEngine, audit: &dyn AuditSink, source: &'static str) -> Value {
    match classify(raw) {
        MCPMessage::ToolCallRequest {
            id,
            tool_name,
            arguments,
            raw,
        } => {
            let outcome = catch_unwind(AssertUnwindSafe(|| engine.evaluate_tool_call(&tool_name, &arguments)));
            let result = match outcome {
                Ok(result) => result,
                Err(panic) => {
                    tracing::error!(tool_name, panic = %panic_message(&panic), "policy engine panicked evaluating tool call");
                    return internal_error_response(id);
                }
            };
            metrics::counter!("agentshield_mcp_decisions_total", "decision" => result.decision.to_string())
                .increment(1);
            tracing::debug!(decision = %result.decision, tool_name, "tool call evaluated");
            audit.record(AuditEntry::new(
                now_rfc3339(),
                source,
                Some(tool_name),
                Some(redact(&arguments)),
                &result,
            ));
            if result.decision == agentshield_core::Decision::Block {
                blocked_response(id, &result.reasons, result.triggered_rules)
            } else {
                raw
            }
        }
        MCPMessage::ResourceReadRequest { id, uri, raw } => {
            let outcome = catch_unwind(AssertUnwindSafe(|| engine.evaluate_resource_read(&uri)));
            let result = match outcome {
                Ok(result) => result,
                Err(panic) => {
                    tracing::error!(uri, panic = %panic_message(&panic), "policy engine panicked evaluating resource read");
                    return internal_error_response(id);
                }
            };
            metrics::counter!("agentshield_mcp_decisions_total", "decision" => result.decision.to_string())
                .increment(1);
            tracing::debug!(decision = %result.decision, uri, "resource read evaluated");
            audit.record(AuditEntry::new(
                now_rfc3339(),
                source,
                None,
                Some(Value::String(uri)),
                &result,
            ));
            if result.decision == agentshield_core::Decision::Block {
                blocked_response(id, &result.reasons, result.triggered_rules)
            } else {
                raw
            }
        }
        MCPMessage::ToolsListResponse { raw } | MCPMessage::Other { raw } => raw,
    }
}

/// Best-effort extraction of a human-readable message from a caught panic
/// payload, for the log line accompanying an internal-error response.
fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Evaluate one outgoing response (or forward anything else untouched).
/// Only `tools/list` responses are inspected: poisoned tool advertisements
/// are dropped before the response reaches the agent.
pub fn process_outgoing(raw: Value, audit: &dyn AuditSink, source: &'static str) -> Value {
    match classify(raw) {
        MCPMessage::ToolsListResponse { raw } => filter_tools_list(raw, audit, source),
        MCPMessage::ToolCallRequest { raw, .. }
        | MCPMessage::ResourceReadRequest { raw, .. }
        | MCPMessage::Other { raw } => raw,
    }
}

fn filter_tools_list(mut raw: Value, audit: &dyn AuditSink, source: &'static str) -> Value {
    let tools: Vec<ToolDefinition> = raw
        .get("result")
        .and_then(|r| r.get("tools"))
        .and_then(|t| serde_json::from_value(t.clone()).ok())
        .unwrap_or_default();

    let mut poisoned_names = HashSet::new();
    for tool in &tools {
        let findings = scan_tool_description(tool);
        if findings.is_empty() {
            continue;
        }
        poisoned_names.insert(tool.name.clone());
        let mut result = agentshield_core::EvalResult::default_only(agentshield_core::Decision::Allow);
        for finding in &findings {
            result.record(
                "poisoned-tool-description",
                agentshield_core::Decision::Block,
                format!("signal `{}`: {}", finding.signal, finding.excerpt),
            );
        }
        audit.record(AuditEntry::new(
            now_rfc3339(),
            source,
            Some(tool.name.clone()),
            None,
            &result,
        ));
    }

    filter_poisoned_tools(&mut raw, &poisoned_names);
    raw
}
