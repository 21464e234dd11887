//! The normalizer: turns an argv vector plus a working directory into a
//! canonical [`NormalizedCommand`]. Pure function, no I/O beyond reading the
//! `HOME` environment variable for `~` expansion.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};
use std::sync::OnceLock;

fn http_url_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"https?://([^/\s'"]+)"#).unwrap())
}

/// The canonical shape a command is reduced to before policy evaluation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct NormalizedCommand {
    pub raw: String,
    pub executable: String,
    pub args: Vec<String>,
    pub cwd: String,
    pub paths: Vec<String>,
    pub domains: Vec<String>,
}

/// Normalize `args` (argv, `args[0]` is the executable) against `cwd`.
///
/// Pure: given the same `args`, `cwd`, and `$HOME`, always returns the same
/// result.
#[must_use]
pub fn normalize(args: &[String], cwd: &str) -> NormalizedCommand {
    let home = std::env::var("HOME").unwrap_or_default();
    normalize_with_home(args, cwd, &home)
}

/// Same as [`normalize`] but with `$HOME` passed explicitly, so callers
/// (and tests) don't need to mutate process-global environment state.
#[must_use]
pub fn normalize_with_home(args: &[String], cwd: &str, home: &str) -> NormalizedCommand {
    let raw = args.join(" ");
    let executable = args
        .first()
        .map(|a| basename(a))
        .unwrap_or_default();

    let mut paths = Vec::new();
    let mut domains = Vec::new();
    let mut seen_domains = std::collections::HashSet::new();

    for (i, arg) in args.iter().enumerate() {
        if is_path_like(arg) {
            paths.push(expand_path(arg, cwd, home));
        }
        for cap in http_url_re().captures_iter(arg) {
            push_domain(&mut domains, &mut seen_domains, &cap[1]);
        }

        // Special case: `git clone git@host:...`
        if i == 2 && executable == "git" && args.get(1).map(String::as_str) == Some("clone") {
            if let Some(host) = scp_style_host(arg) {
                push_domain(&mut domains, &mut seen_domains, &host);
            }
        }
    }

    NormalizedCommand {
        raw,
        executable,
        args: args.to_vec(),
        cwd: cwd.to_string(),
        paths,
        domains,
    }
}

fn push_domain(domains: &mut Vec<String>, seen: &mut std::collections::HashSet<String>, host: &str) {
    if seen.insert(host.to_string()) {
        domains.push(host.to_string());
    }
}

/// `git@host:owner/repo.git` → `host`. Returns `None` for http(s) URLs
/// (those are covered by the generic extractor) or anything else that
/// doesn't look like an SCP-style target.
fn scp_style_host(arg: &str) -> Option<String> {
    if arg.starts_with("http://") || arg.starts_with("https://") {
        return None;
    }
    let (user_host, _path) = arg.split_once(':')?;
    let host = user_host.split_once('@').map(|(_, h)| h).unwrap_or(user_host);
    if host.is_empty() || host.contains('/') {
        return None;
    }
    Some(host.to_string())
}

fn basename(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string())
}

fn is_path_like(arg: &str) -> bool {
    if arg.starts_with('-') {
        return false;
    }
    if arg.starts_with("http://") || arg.starts_with("https://") {
        return false;
    }
    arg.starts_with('/')
        || arg.starts_with("./")
        || arg.starts_with("../")
        || arg.starts_with("~/")
        || arg.contains('/')
}

fn expand_path(arg: &str, cwd: &str, home: &str) -> String {
    let expanded = if let Some(rest) = arg.strip_prefix("~/") {
        format!("{}/{}", home.trim_end_matches('/'), rest)
    } else if Path::new(arg).is_absolute() {
        arg.to_string()
    } else {
        format!("{}/{}", cwd.trim_end_matches('/'), arg)
    };
    clean_path(&expanded)
}

/// Remove `.` and `..` segments without touching the filesystem (`..` at the
/// root is dropped rather than erroring, matching typical `path.Clean`
/// semantics).
fn clean_path(path: &str) -> String {
    let mut out: Vec<Component> = Vec::new();
    for comp in Path::new(path).components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(out.last(), Some(Component::Normal(_))) {
                    out.pop();
                } else if !matches!(out.last(), Some(Component::RootDir)) {
                    out.push(comp);
                }
            }
            other => out.push(other),
        }
    }
    let cleaned: PathBuf = out.into_iter().collect();
    let s = cleaned.to_string_lossy().to_string();
    if s.is_empty() {
        "/".to_string()
    } else {
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn executable_is_basename() {
        let n = normalize(&args(&["/usr/bin/rm", "-rf", "/"]), "/home/alice");
        assert_eq!(n.executable, "rm");
    }

    #[test]
    fn extracts_absolute_and_relative_paths() {
        let n = normalize(&args(&["cat", "./notes.txt", "/etc/passwd", "-v"]), "/home/alice");
        assert_eq!(n.paths, vec!["/home/alice/notes.txt", "/etc/passwd"]);
    }

    #[test]
    fn tilde_expands_against_home() {
        let n = normalize_with_home(&args(&["cat", "~/.ssh/id_rsa"]), "/tmp", "/home/bob");
        assert_eq!(n.paths, vec!["/home/bob/.ssh/id_rsa"]);
    }

    #[test]
    fn http_url_is_not_treated_as_a_path_but_yields_a_domain() {
        let n = normalize(&args(&["curl", "https://example.com/x.sh"]), "/tmp");
        assert!(n.paths.is_empty());
        assert_eq!(n.domains, vec!["example.com"]);
    }

    #[test]
    fn git_clone_scp_style_extracts_host() {
        let n = normalize(&args(&["git", "clone", "git@github.com:foo/bar.git"]), "/tmp");
        assert_eq!(n.domains, vec!["github.com"]);
    }

    #[test]
    fn git_clone_https_style_uses_generic_extractor() {
        let n = normalize(&args(&["git", "clone", "https://github.com/foo/bar.git"]), "/tmp");
        assert_eq!(n.domains, vec!["github.com"]);
    }

    #[test]
    fn domains_are_deduplicated_preserving_first_seen_order() {
        let n = normalize(
            &args(&[
                "curl",
                "https://b.com/x",
                "https://a.com/y",
                "https://b.com/z",
            ]),
            "/tmp",
        );
        assert_eq!(n.domains, vec!["b.com", "a.com"]);
    }

    #[test]
    fn paths_are_cleaned_of_dot_segments() {
        let n = normalize(&args(&["cat", "/a/b/../c/./d"]), "/tmp");
        assert_eq!(n.paths, vec!["/a/c/d"]);
    }

    #[test]
    fn normalize_is_idempotent_on_paths() {
        let first = normalize(&args(&["cat", "./a.txt", "/etc/passwd"]), "/home/alice");
        let second = normalize(&first.args, "/home/alice");
        assert_eq!(first.paths, second.paths);
    }
}
