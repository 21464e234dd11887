//! The stdio transport: spawns the downstream MCP server as a child
//! process, inheriting stderr, and pumps newline-delimited JSON-RPC between
//! the proxy's own stdio and the child's.
//!
//! Mirrors `assay-core::mcp::proxy::McpProxy`'s two-pump-threads design,
//! rebuilt on `tokio::process` so it shares an async runtime with the HTTP
//! transport instead of spawning `std::thread`s.

use crate::audit::AuditSink;
use crate::pipeline::{process_incoming, process_outgoing};
use crate::session::{SessionState, SharedSessionState};
use agentshield_core::mcp::Engine as McpEngine;
use serde_json::Value;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};

/// Bound on how long shutdown waits for the pump tasks to unwind after
/// SIGINT, mirroring the HTTP transport's default drain deadline (spec.md's
/// "shutdown is cooperative with a deadline").
const SHUTDOWN_DEADLINE: Duration = Duration::from_secs(5);

pub struct StdioProxy {
    child: Child,
    engine: Arc<McpEngine>,
    audit: Arc<dyn AuditSink>,
    state: Arc<SharedSessionState>,
}

impl StdioProxy {
    /// Spawn `command args...` as the downstream server. stderr is
    /// inherited so the child's own diagnostics reach the operator; the
    /// JSON-RPC protocol itself stays on stdout.
    pub fn spawn(
        command: &str,
        args: &[String],
        engine: Arc<McpEngine>,
        audit: Arc<dyn AuditSink>,
    ) -> io::Result<Self> {
        let child = Command::new(command)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()?;

        Ok(Self {
            child,
            engine,
            audit,
            state: Arc::new(SharedSessionState::default()),
        })
    }

    #[must_use]
    pub fn state(&self) -> Arc<SharedSessionState> {
        self.state.clone()
    }

    /// Run the session to completion: proxy exit code mirrors the child's.
    pub async fn run(mut self) -> io::Result<i32> {
        self.state.set(SessionState::Running);

        let mut child_stdin = self.child.stdin.take().expect("child stdin was piped");
        let child_stdout = self.child.stdout.take().expect("child stdout was piped");

        let engine = self.engine.clone();
        let audit = self.audit.clone();
        let state = self.state.clone();
        let client_to_server = tokio::spawn(async move {
            let mut lines = BufReader::new(io::stdin()).lines();
            while state.accepts_new_messages() {
                let Some(line) = lines.next_line().await? else {
                    break;
                };
                let out_line = rewrite_line(&line, |value| {
                    process_incoming(value, &engine, audit.as_ref(), "mcp-proxy")
                });
                child_stdin.write_all(out_line.as_bytes()).await?;
                child_stdin.write_all(b"\n").await?;
                child_stdin.flush().await?;
            }
            io::Result::Ok(())
        });

        let audit = self.audit.clone();
        let server_to_client = tokio::spawn(async move {
            let mut lines = BufReader::new(child_stdout).lines();
            let mut out = io::stdout();
            while let Some(line) = lines.next_line().await? {
                let out_line =
                    rewrite_line(&line, |value| process_outgoing(value, audit.as_ref(), "mcp-proxy"));
                out.write_all(out_line.as_bytes()).await?;
                out.write_all(b"\n").await?;
                out.flush().await?;
            }
            io::Result::Ok(())
        });

        let mut client_to_server = Some(client_to_server);
        let mut server_to_client = Some(server_to_client);
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        tokio::select! {
            _ = &mut ctrl_c => {
                self.state.set(SessionState::Draining);
                let _ = self.child.start_kill();
                // Killing the child closes its stdout, which unblocks
                // `server_to_client` on its own, but `client_to_server`
                // reads the proxy's own stdin — nothing about the child
                // exiting touches that pipe. Abort it directly rather than
                // waiting on whatever holds the other end to close it.
                client_to_server.as_ref().unwrap().abort();
                server_to_client.as_ref().unwrap().abort();
            }
            res = async { client_to_server.as_mut().unwrap().await }, if client_to_server.is_some() => {
                client_to_server = None;
                self.state.set(SessionState::Draining);
                let _ = res;
            }
            res = async { server_to_client.as_mut().unwrap().await }, if server_to_client.is_some() => {
                server_to_client = None;
                self.state.set(SessionState::Draining);
                let _ = res;
            }
        }

        // Aborted or already-finished pump tasks resolve promptly; bound
        // the wait regardless so a pump that's neither can never hang the
        // session past the shutdown deadline.
        if let Some(handle) = client_to_server {
            let _ = tokio::time::timeout(SHUTDOWN_DEADLINE, handle).await;
        }
        if let Some(handle) = server_to_client {
            let _ = tokio::time::timeout(SHUTDOWN_DEADLINE, handle).await;
        }

        let status = self.child.wait().await?;
        self.state.set(SessionState::Closed);
        Ok(status.code().unwrap_or(1))
    }
}

/// Parse `line` as JSON and run it through `transform`; a line that doesn't
/// parse as JSON is forwarded byte-for-byte, transparent to the peer.
fn rewrite_line(line: &str, transform: impl FnOnce(Value) -> Value) -> String {
    match serde_json::from_str::<Value>(line) {
        Ok(value) => serde_json::to_string(&transform(value)).unwrap_or_else(|_| line.to_string()),
        Err(_) => line.to_string(),
    }
}
