//! `agentshield mcp stdio|http`: spawn the MCP proxy transports.

use crate::args::{HttpArgs, StdioArgs};
use agentshield_core::mcp::{load_packs, Engine, McpPolicy};
use agentshield_proxy::{AuditSink, FileAuditSink, HttpProxy, NullAuditSink, StdioProxy};
use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;

fn build_engine(policy: Option<std::path::PathBuf>, packs: Option<std::path::PathBuf>) -> anyhow::Result<Engine> {
    let base = match &policy {
        Some(path) => {
            McpPolicy::load(path).with_context(|| format!("loading MCP policy from {}", path.display()))?
        }
        None => McpPolicy::default_policy(),
    };

    let pack_dir = packs.or_else(agentshield_core::config::default_pack_dir);
    let merged = if let Some(dir) = pack_dir {
        let (merged, infos) = load_packs(&dir, &base);
        for info in &infos {
            if let Some(error) = &info.error {
                tracing::warn!(pack = %info.path.display(), %error, "pack failed to load, skipping");
            }
        }
        merged
    } else {
        base
    };

    Engine::new(merged).context("compiling MCP policy")
}

fn build_audit_sink(audit_log: Option<std::path::PathBuf>) -> anyhow::Result<Arc<dyn AuditSink>> {
    Ok(match audit_log {
        Some(path) => Arc::new(
            FileAuditSink::open(&path).with_context(|| format!("opening audit log at {}", path.display()))?,
        ),
        None => Arc::new(NullAuditSink),
    })
}

pub async fn stdio(args: StdioArgs) -> anyhow::Result<i32> {
    if args.command.is_empty() {
        anyhow::bail!("no command specified; usage: agentshield mcp stdio -- <cmd> [args]");
    }
    let engine = Arc::new(build_engine(args.policy, args.packs)?);
    let audit = build_audit_sink(args.audit_log)?;

    let cmd = &args.command[0];
    let cmd_args = &args.command[1..];
    tracing::info!(command = %cmd, fingerprint = %engine.fingerprint(), "spawning downstream MCP server over stdio");

    let proxy = StdioProxy::spawn(cmd, cmd_args, engine, audit).context("spawning downstream MCP server")?;
    let code = proxy.run().await.context("running stdio proxy session")?;
    Ok(code)
}

pub async fn http(args: HttpArgs) -> anyhow::Result<i32> {
    let engine = Arc::new(build_engine(args.policy, args.packs)?);
    let audit = build_audit_sink(args.audit_log)?;

    tracing::info!(listen = %args.listen, upstream = %args.upstream, fingerprint = %engine.fingerprint(), "starting MCP HTTP proxy");
    let proxy = HttpProxy::bind(args.listen, args.upstream, engine, audit)
        .await
        .context("binding HTTP proxy listener")?;
    let addr = proxy.local_addr().context("reading bound address")?;
    eprintln!("[agentshield] listening on http://{addr}");

    proxy
        .run(Duration::from_secs(args.shutdown_deadline_secs))
        .await
        .context("running HTTP proxy")?;
    Ok(0)
}
