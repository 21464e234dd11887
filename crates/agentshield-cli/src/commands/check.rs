//! `agentshield check -- <command> [args...]`: evaluate a single shell
//! command against the shell policy engine and report the decision, mirroring
//! what a shell hook would do before letting a command run.

use crate::args::CheckArgs;
use agentshield_core::shell::engine::Engine;
use agentshield_core::shell::packs::load_packs;
use agentshield_core::shell::policy::Policy;
use agentshield_core::{normalize, Decision};
use anyhow::Context;

pub fn run(args: CheckArgs) -> anyhow::Result<i32> {
    let base = match &args.policy {
        Some(path) => Policy::load(path)
            .with_context(|| format!("loading policy from {}", path.display()))?,
        None => Policy::default_policy(),
    };

    let pack_dir = args
        .packs
        .clone()
        .or_else(agentshield_core::config::default_pack_dir);
    let policy = if let Some(dir) = pack_dir {
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

    let engine = Engine::new(policy).context("compiling shell policy")?;
    let normalized = normalize(&args.command, &args.cwd);
    let result = engine.evaluate_with_domains(&normalized.raw, &normalized.paths, &normalized.domains);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!(
            "{} ({}) — {}",
            result.decision,
            result.decision.severity_label(),
            if result.explanation.is_empty() {
                "no rule matched".to_string()
            } else {
                result.explanation.clone()
            }
        );
        if result.decision == Decision::Block {
            eprintln!("BLOCKED by AgentShield: {}", result.explanation);
        }
    }

    Ok(match result.decision {
        Decision::Allow | Decision::Audit => 0,
        Decision::Block => 1,
    })
}
