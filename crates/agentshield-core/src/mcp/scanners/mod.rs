//! Guardrail scanners, independent of any loaded policy: tool-description
//! poisoning detection, tool-call content exfiltration scanning, and a
//! config-file protection catalogue. These run before rule evaluation; any
//! `blocked`/`poisoned` verdict dominates.

mod config_guard;
mod exfiltration;
mod poisoning;

pub use config_guard::{check_config_guard, ConfigGuardHit};
pub use exfiltration::{redact, scan_tool_call_content, ExfiltrationFinding};
pub use poisoning::{scan_tool_description, PoisoningFinding};
