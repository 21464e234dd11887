//! Detects tool-description poisoning: hostile instructions embedded in a
//! `tools/list` advertisement designed to manipulate the agent reading it
//! rather than the tool's actual caller.

use super::super::ToolDefinition;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PoisoningFinding {
    pub signal: String,
    pub excerpt: String,
}

struct Signal {
    name: &'static str,
    needle: &'static str,
}

const SIGNALS: &[Signal] = &[
    Signal {
        name: "hidden-directive-tag",
        needle: "<important>",
    },
    Signal {
        name: "hidden-directive-tag",
        needle: "<system>",
    },
    Signal {
        name: "instruction-override",
        needle: "ignore previous instructions",
    },
    Signal {
        name: "instruction-override",
        needle: "ignore all previous instructions",
    },
    Signal {
        name: "concealment-request",
        needle: "do not mention",
    },
    Signal {
        name: "concealment-request",
        needle: "don't tell the user",
    },
    Signal {
        name: "smuggled-sidenote",
        needle: "sidenote",
    },
    Signal {
        name: "credential-file-reference",
        needle: ".ssh/",
    },
    Signal {
        name: "credential-file-reference",
        needle: ".aws/",
    },
    Signal {
        name: "credential-file-reference",
        needle: "id_rsa",
    },
];

fn excerpt_around(haystack: &str, needle_lower: &str, lowered: &str) -> String {
    const RADIUS: usize = 30;
    let Some(start) = lowered.find(needle_lower) else {
        return haystack.to_string();
    };
    let end = (start + needle_lower.len() + RADIUS).min(haystack.len());
    let begin = start.saturating_sub(RADIUS);
    haystack[begin..end].to_string()
}

/// Scan a tool's advertised `description` for hostile-instruction signals.
/// A non-empty finding set means the tool is poisoned and should be dropped
/// from any `tools/list` response forwarded to the agent.
#[must_use]
pub fn scan_tool_description(tool: &ToolDefinition) -> Vec<PoisoningFinding> {
    let lowered = tool.description.to_lowercase();
    SIGNALS
        .iter()
        .filter(|s| lowered.contains(s.needle))
        .map(|s| PoisoningFinding {
            signal: s.name.to_string(),
            excerpt: excerpt_around(&tool.description, s.needle, &lowered),
        })
        .collect()
}
