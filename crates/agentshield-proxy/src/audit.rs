//! Audit sinks for the MCP proxy. A sink is invoked synchronously from the
//! pump for every evaluated request/response, mirroring
//! `assay-core::mcp::audit::AuditLog`'s append-only-file design but
//! generalized over a trait so a caller can also wire a callback (e.g. the
//! CLI's `--verbose` stderr echo, or a test's in-memory sink).

use agentshield_core::eval_result::Decision;
use serde::Serialize;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

/// One evaluated request or response, in the shape described by the
/// external-interfaces section: timestamp, direction/source, tool name (if
/// any), decision, triggered rule ids, reasons, and a scrubbed argument
/// snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEntry {
    pub timestamp: String,
    pub source: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arguments: Option<serde_json::Value>,
    pub decision: Decision,
    pub triggered_rules: Vec<String>,
    pub reasons: Vec<String>,
    pub flagged: bool,
}

impl AuditEntry {
    #[must_use]
    pub fn new(
        timestamp: String,
        source: &'static str,
        tool_name: Option<String>,
        arguments: Option<serde_json::Value>,
        result: &agentshield_core::EvalResult,
    ) -> Self {
        Self {
            timestamp,
            source,
            tool_name,
            arguments,
            decision: result.decision,
            triggered_rules: result.triggered_rules.clone(),
            reasons: result.reasons.clone(),
            flagged: result.decision != Decision::Allow,
        }
    }
}

/// Invoked synchronously from the pump. Implementations that persist state
/// (a file, a socket) are responsible for their own thread-safety; callers
/// may hold this behind an `Arc` and share it across pump tasks.
pub trait AuditSink: Send + Sync {
    fn record(&self, entry: AuditEntry);
}

/// Discards every entry. The default when no sink is configured.
pub struct NullAuditSink;

impl AuditSink for NullAuditSink {
    fn record(&self, _entry: AuditEntry) {}
}

/// Appends one NDJSON line per entry to a file, behind a mutex so
/// concurrent pump directions don't interleave partial lines. A write
/// failure is logged to stderr at most once per sink lifetime and never
/// propagated: per the error-handling design, audit sink failure must never
/// abort a decision.
pub struct FileAuditSink {
    file: Mutex<std::fs::File>,
    warned: std::sync::atomic::AtomicBool,
}

impl FileAuditSink {
    pub fn open(path: &Path) -> std::io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
            warned: std::sync::atomic::AtomicBool::new(false),
        })
    }
}

impl AuditSink for FileAuditSink {
    fn record(&self, entry: AuditEntry) {
        let line = match serde_json::to_string(&entry) {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!(error = %e, "failed to serialize audit entry");
                return;
            }
        };
        let result = self
            .file
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .write_all(format!("{line}\n").as_bytes());
        if let Err(e) = result {
            if !self.warned.swap(true, std::sync::atomic::Ordering::Relaxed) {
                tracing::warn!(error = %e, "audit sink write failed; further failures this session are suppressed");
            }
        }
    }
}

/// Wraps an arbitrary closure as an [`AuditSink`], for embedding callers
/// (tests, the CLI's stderr echo) that don't need file persistence.
pub struct CallbackAuditSink<F>(F)
where
    F: Fn(AuditEntry) + Send + Sync;

impl<F> CallbackAuditSink<F>
where
    F: Fn(AuditEntry) + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> AuditSink for CallbackAuditSink<F>
where
    F: Fn(AuditEntry) + Send + Sync,
{
    fn record(&self, entry: AuditEntry) {
        (self.0)(entry);
    }
}

#[must_use]
pub fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentshield_core::EvalResult;

    fn sample_entry() -> AuditEntry {
        let result = EvalResult::default_only(Decision::Block);
        AuditEntry::new(
            "2026-01-01T00:00:00Z".to_string(),
            "mcp-proxy",
            Some("read_file".to_string()),
            Some(serde_json::json!({"path": "/etc/passwd"})),
            &result,
        )
    }

    #[test]
    fn flagged_is_true_for_anything_above_allow() {
        assert!(sample_entry().flagged);
        let allow = EvalResult::default_only(Decision::Allow);
        let entry = AuditEntry::new(
            "t".to_string(),
            "mcp-proxy",
            None,
            None,
            &allow,
        );
        assert!(!entry.flagged);
    }

    #[test]
    fn file_sink_appends_one_json_line_per_entry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.ndjson");
        let sink = FileAuditSink::open(&path).unwrap();
        sink.record(sample_entry());
        sink.record(sample_entry());
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
        for line in content.lines() {
            let parsed: serde_json::Value = serde_json::from_str(line).unwrap();
            assert_eq!(parsed["tool_name"], "read_file");
        }
    }

    #[test]
    fn callback_sink_invokes_closure() {
        let seen = std::sync::Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();
        let sink = CallbackAuditSink::new(move |entry: AuditEntry| {
            seen_clone.lock().unwrap().push(entry.tool_name);
        });
        sink.record(sample_entry());
        assert_eq!(seen.lock().unwrap().as_slice(), [Some("read_file".to_string())]);
    }
}
