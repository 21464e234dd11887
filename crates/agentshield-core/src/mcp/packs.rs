//! Pack loading for MCP policy, mirroring [`crate::shell::packs`]: base plus
//! an ordered directory of `*.yaml` files, `_`-prefix disables without
//! deleting, a single malformed pack is reported but non-fatal.

use super::policy::{McpPolicy, McpRule, ResourceRule, ValueLimit};
use crate::shell::packs::PackInfo;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct McpPack {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub author: String,

    #[serde(default)]
    pub blocked_tools: Vec<String>,
    #[serde(default)]
    pub blocked_resources: Vec<String>,
    #[serde(default)]
    pub rules: Vec<McpRule>,
    #[serde(default)]
    pub value_limits: Vec<ValueLimit>,
    #[serde(default)]
    pub resource_rules: Vec<ResourceRule>,
}

pub fn load_packs(dir: &Path, base: &McpPolicy) -> (McpPolicy, Vec<PackInfo>) {
    let mut merged = base.clone();
    let mut infos = Vec::new();

    let mut entries: Vec<PathBuf> = match std::fs::read_dir(dir) {
        Ok(read_dir) => read_dir
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("yaml"))
            .collect(),
        Err(_) => return (merged, infos),
    };
    entries.sort();

    for path in entries {
        let basename = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();

        if basename.starts_with('_') {
            infos.push(PackInfo {
                path,
                name: basename,
                enabled: false,
                rule_count: None,
                error: None,
            });
            continue;
        }

        match std::fs::read_to_string(&path).and_then(|content| {
            serde_yaml::from_str::<McpPack>(&content)
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
        }) {
            Ok(pack) => {
                let rule_count = pack.rules.len();
                let name = if pack.name.is_empty() {
                    basename
                } else {
                    pack.name.clone()
                };
                merge_pack(&mut merged, pack);
                infos.push(PackInfo {
                    path,
                    name,
                    enabled: true,
                    rule_count: Some(rule_count),
                    error: None,
                });
            }
            Err(e) => {
                infos.push(PackInfo {
                    path,
                    name: basename,
                    enabled: false,
                    rule_count: None,
                    error: Some(e.to_string()),
                });
            }
        }
    }

    (merged, infos)
}

fn merge_pack(policy: &mut McpPolicy, pack: McpPack) {
    for glob in pack.blocked_tools {
        if !policy.blocked_tools.contains(&glob) {
            policy.blocked_tools.push(glob);
        }
    }
    for glob in pack.blocked_resources {
        if !policy.blocked_resources.contains(&glob) {
            policy.blocked_resources.push(glob);
        }
    }
    policy.rules.extend(pack.rules);
    policy.value_limits.extend(pack.value_limits);
    policy.resource_rules.extend(pack.resource_rules);
}
