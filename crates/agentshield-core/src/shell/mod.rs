//! The shell command policy engine: policy document shape, pack loading,
//! and rule evaluation.

pub mod engine;
pub mod packs;
pub mod policy;

pub use engine::Engine;
pub use packs::{load_packs, Pack, PackInfo};
pub use policy::{Defaults, Network, Policy, Rule, RuleMatch};
