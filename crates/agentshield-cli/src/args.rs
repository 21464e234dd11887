//! Command-line surface. Intentionally thin: three subcommands only, no
//! installer/setup surface.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "agentshield",
    version,
    about = "A local security gateway mediating shell commands and MCP tool calls"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Evaluate a single shell command against the shell policy and print
    /// the decision.
    Check(CheckArgs),
    /// MCP proxy transports.
    #[command(subcommand)]
    Mcp(McpCommand),
}

#[derive(Subcommand)]
pub enum McpCommand {
    /// Spawn a downstream MCP server over stdio and proxy its traffic.
    Stdio(StdioArgs),
    /// Reverse-proxy a Streamable HTTP MCP server.
    Http(HttpArgs),
}

#[derive(Parser)]
pub struct CheckArgs {
    /// Path to a shell policy YAML file. Falls back to the built-in default
    /// policy when omitted.
    #[arg(long)]
    pub policy: Option<PathBuf>,

    /// Directory of policy pack YAML files to merge on top of the base
    /// policy. Defaults to the XDG pack directory when omitted.
    #[arg(long)]
    pub packs: Option<PathBuf>,

    /// Working directory the command is evaluated relative to.
    #[arg(long, default_value = ".")]
    pub cwd: String,

    /// Emit the full evaluation result as JSON instead of a one-line summary.
    #[arg(long)]
    pub json: bool,

    /// The command and its arguments, e.g. `agentshield check -- rm -rf /`.
    #[arg(last = true, required = true)]
    pub command: Vec<String>,
}

#[derive(Parser)]
pub struct StdioArgs {
    /// Path to an MCP policy YAML file. Falls back to the built-in default
    /// policy when omitted.
    #[arg(long)]
    pub policy: Option<PathBuf>,

    #[arg(long)]
    pub packs: Option<PathBuf>,

    /// Append an NDJSON audit entry per evaluated message to this file.
    #[arg(long)]
    pub audit_log: Option<PathBuf>,

    /// The downstream server command and its arguments, e.g.
    /// `agentshield mcp stdio -- npx -y @modelcontextprotocol/server-filesystem /tmp`.
    #[arg(last = true, required = true)]
    pub command: Vec<String>,
}

#[derive(Parser)]
pub struct HttpArgs {
    #[arg(long)]
    pub policy: Option<PathBuf>,

    #[arg(long)]
    pub packs: Option<PathBuf>,

    #[arg(long)]
    pub audit_log: Option<PathBuf>,

    /// Address to listen on. Port `0` lets the OS assign one.
    #[arg(long, default_value = "127.0.0.1:8787")]
    pub listen: std::net::SocketAddr,

    /// URL of the downstream Streamable HTTP MCP server being fronted.
    #[arg(long)]
    pub upstream: url::Url,

    /// Seconds to keep draining in-flight connections after shutdown before
    /// dropping them.
    #[arg(long, default_value_t = 5)]
    pub shutdown_deadline_secs: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_check_with_trailing_command() {
        let cli = Cli::parse_from(["agentshield", "check", "--", "rm", "-rf", "/"]);
        match cli.command {
            Command::Check(args) => assert_eq!(args.command, vec!["rm", "-rf", "/"]),
            _ => panic!("expected Check"),
        }
    }

    #[test]
    fn parses_mcp_stdio_with_downstream_command() {
        let cli = Cli::parse_from(["agentshield", "mcp", "stdio", "--", "npx", "server-fs"]);
        match cli.command {
            Command::Mcp(McpCommand::Stdio(args)) => {
                assert_eq!(args.command, vec!["npx", "server-fs"]);
            }
            _ => panic!("expected Mcp Stdio"),
        }
    }

    #[test]
    fn parses_mcp_http_with_upstream_url() {
        let cli = Cli::parse_from([
            "agentshield",
            "mcp",
            "http",
            "--upstream",
            "http://localhost:9000",
        ]);
        match cli.command {
            Command::Mcp(McpCommand::Http(args)) => {
                assert_eq!(args.upstream.as_str(), "http://localhost:9000/");
                assert_eq!(args.shutdown_deadline_secs, 5);
            }
            _ => panic!("expected Mcp Http"),
        }
    }
}
