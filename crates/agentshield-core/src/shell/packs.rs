//! Pack loading and merging. A pack is an auxiliary YAML file, structurally
//! a [`Policy`] plus metadata, merged into a base policy: rules are
//! appended, protected-paths and allow-domains are set-unioned.

use super::policy::{Policy, Rule};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Pack {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub author: String,

    #[serde(default)]
    pub rules: Vec<Rule>,

    #[serde(default)]
    pub protected_paths: Vec<String>,

    #[serde(default)]
    pub allow_domains: Vec<String>,
}

/// Per-pack-file load outcome, reported back to the caller regardless of
/// whether the pack parsed. A parse failure here never aborts
/// [`load_packs`]: only that one pack is skipped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackInfo {
    pub path: PathBuf,
    pub name: String,
    pub enabled: bool,
    pub rule_count: Option<usize>,
    pub error: Option<String>,
}

/// Enumerate `dir` for `*.yaml` files, merge every enabled one into `base`
/// in directory-entry order, and return the merged policy plus a
/// [`PackInfo`] per discovered file.
///
/// A missing directory is not an error: `base` is returned unchanged.
pub fn load_packs(dir: &Path, base: &Policy) -> (Policy, Vec<PackInfo>) {
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
            serde_yaml::from_str::<Pack>(&content)
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

/// Merge a single pack into `policy`: rules appended, protected-paths and
/// allow-domains unioned (idempotent on repeated merges).
fn merge_pack(policy: &mut Policy, pack: Pack) {
    policy.rules.extend(pack.rules);

    for path in pack.protected_paths {
        if !policy.defaults.protected_paths.contains(&path) {
            policy.defaults.protected_paths.push(path);
        }
    }

    for domain in pack.allow_domains {
        if !policy.network.allow_domains.contains(&domain) {
            policy.network.allow_domains.push(domain);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval_result::Decision;
    use std::fs;

    fn write(dir: &Path, name: &str, content: &str) {
        fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn missing_directory_yields_base_unchanged() {
        let base = Policy::default_policy();
        let (merged, infos) = load_packs(Path::new("/nonexistent/agentshield/packs"), &base);
        assert_eq!(merged.rules.len(), base.rules.len());
        assert!(infos.is_empty());
    }

    #[test]
    fn underscore_prefixed_pack_is_disabled_and_skipped() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "_disabled.yaml",
            "name: disabled\nrules:\n  - id: x\n    match: {}\n    decision: BLOCK\n    reason: nope\n",
        );
        let base = Policy::default_policy();
        let (merged, infos) = load_packs(dir.path(), &base);
        assert_eq!(merged.rules.len(), base.rules.len());
        assert_eq!(infos.len(), 1);
        assert!(!infos[0].enabled);
        assert!(infos[0].rule_count.is_none());
    }

    #[test]
    fn malformed_pack_is_skipped_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "broken.yaml", "this: [is not, valid: yaml");
        let base = Policy::default_policy();
        let (merged, infos) = load_packs(dir.path(), &base);
        assert_eq!(merged.rules.len(), base.rules.len());
        assert_eq!(infos.len(), 1);
        assert!(!infos[0].enabled);
        assert!(infos[0].error.is_some());
    }

    #[test]
    fn enabled_pack_appends_rules_and_unions_sets() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "finance.yaml",
            r#"
name: finance
rules:
  - id: audit-package-installs
    match:
      executable: curl
    decision: AUDIT
    reason: financial pack rule
protected_paths:
  - "**/.aws/credentials"
allow_domains:
  - api.stripe.com
"#,
        );
        let base = Policy::default_policy();
        let base_rule_count = base.rules.len();
        let (merged, infos) = load_packs(dir.path(), &base);
        assert_eq!(merged.rules.len(), base_rule_count + 1);
        assert_eq!(merged.rules.last().unwrap().decision, Decision::Audit);
        assert!(merged
            .network
            .allow_domains
            .contains(&"api.stripe.com".to_string()));
        assert_eq!(infos.len(), 1);
        assert!(infos[0].enabled);
        assert_eq!(infos[0].rule_count, Some(1));
    }

    #[test]
    fn pack_ordering_is_directory_entry_order_appended_after_base() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "a_pack.yaml",
            "rules:\n  - id: a\n    match: {}\n    decision: ALLOW\n    reason: a\n",
        );
        write(
            dir.path(),
            "b_pack.yaml",
            "rules:\n  - id: b\n    match: {}\n    decision: ALLOW\n    reason: b\n",
        );
        let base = Policy::default_policy();
        let (merged, _) = load_packs(dir.path(), &base);
        let ids: Vec<&str> = merged.rules.iter().map(|r| r.id.as_str()).collect();
        let base_ids: Vec<&str> = base.rules.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(&ids[..base_ids.len()], &base_ids[..]);
        assert_eq!(&ids[base_ids.len()..], &["a", "b"]);
    }

    #[test]
    fn merge_is_idempotent_on_protected_paths_and_allow_domains() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "x.yaml",
            "protected_paths:\n  - \"/etc/shadow\"\nallow_domains:\n  - api.stripe.com\n",
        );
        let base = Policy::default_policy();
        let (once, _) = load_packs(dir.path(), &base);
        let (twice, _) = load_packs(dir.path(), &once);
        assert_eq!(once.defaults.protected_paths, twice.defaults.protected_paths);
        assert_eq!(once.network.allow_domains, twice.network.allow_domains);
    }
}
