//! Command normalization, the shell and MCP policy engines, and the
//! guardrail scanner library that back AgentShield's decision pipeline.
//!
//! This crate has no network or filesystem side effects of its own beyond
//! loading policy YAML from a path it's given: it is a pure decision layer,
//! consumed by the stdio/HTTP proxy and the CLI's `check` subcommand.

pub mod config;
pub mod errors;
pub mod eval_result;
pub mod fingerprint;
pub mod matchers;
pub mod mcp;
pub mod normalize;
pub mod shell;

pub use errors::{EngineBuildError, PolicyLoadError};
pub use eval_result::{Decision, EvalResult};
pub use fingerprint::{fingerprint, sha256_hex};
pub use normalize::{normalize, NormalizedCommand};
