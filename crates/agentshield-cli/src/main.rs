mod args;
mod commands;

use args::{Cli, Command, McpCommand};
use clap::Parser;

#[tokio::main]
async fn main() {
    init_logging();
    let cli = Cli::parse();

    let code = match dispatch(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("fatal: {e:?}");
            2
        }
    };
    std::process::exit(code);
}

async fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    match cli.command {
        Command::Check(args) => commands::check::run(args),
        Command::Mcp(McpCommand::Stdio(args)) => commands::mcp::stdio(args).await,
        Command::Mcp(McpCommand::Http(args)) => commands::mcp::http(args).await,
    }
}

fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new("info"))
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
