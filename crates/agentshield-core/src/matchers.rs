//! Pure matcher functions shared by the shell and MCP engines.
//!
//! Two distinct glob dialects are implemented: a flat "name-glob" for tool
//! and executable names, and a `/`-segmented "path-glob" supporting `**`.

/// Name-glob: `*` matches any run of characters within a single token; no
/// path segmentation. Used for executable names and MCP tool names.
#[must_use]
pub fn name_glob_match(pattern: &str, candidate: &str) -> bool {
    if pattern == "*" {
        return true;
    }
    glob_segment(pattern.as_bytes(), candidate.as_bytes())
}

/// Recursive single-segment glob matcher (`*` only, no `**`, no `/`
/// semantics). Used both by [`name_glob_match`] and per-segment inside
/// [`path_glob_match`].
fn glob_segment(pattern: &[u8], candidate: &[u8]) -> bool {
    match pattern.split_first() {
        None => candidate.is_empty(),
        Some((b'*', rest)) => {
            // Try consuming 0..=len bytes of candidate for this '*'.
            for i in 0..=candidate.len() {
                if glob_segment(rest, &candidate[i..]) {
                    return true;
                }
            }
            false
        }
        Some((&c, rest)) => match candidate.split_first() {
            Some((&d, crest)) if c == d => glob_segment(rest, crest),
            _ => false,
        },
    }
}

/// Path-glob: pattern and candidate are segmented on `/`. Within a segment
/// `*` matches any run of characters (no `/`). `**` matches zero or more
/// whole segments.
#[must_use]
pub fn path_glob_match(pattern: &str, candidate: &str) -> bool {
    let pattern_segs: Vec<&str> = pattern.split('/').collect();
    let candidate_segs: Vec<&str> = candidate.split('/').collect();
    glob_match_segs(&candidate_segs, &pattern_segs)
}

fn glob_match_segs(cand: &[&str], pat: &[&str]) -> bool {
    match pat.split_first() {
        None => cand.is_empty(),
        Some((&"**", rest)) => {
            // Either the rest of the pattern matches here (closing out the
            // `**`), or `**` consumes one more candidate segment and we try
            // again.
            if glob_match_segs(cand, rest) {
                return true;
            }
            match cand.split_first() {
                Some((_, crest)) => glob_match_segs(crest, pat),
                None => false,
            }
        }
        Some((head, rest)) => match cand.split_first() {
            Some((cseg, crest)) if glob_segment(head.as_bytes(), cseg.as_bytes()) => {
                glob_match_segs(crest, rest)
            }
            _ => false,
        },
    }
}

/// Coerce a JSON value to `f64` for numeric value-limit comparisons.
/// Non-numeric values (including numeric-looking strings) never match.
#[must_use]
pub fn coerce_number(value: &serde_json::Value) -> Option<f64> {
    value.as_f64()
}

/// Whether `domain` is present in an allow/deny domain set, exact match
/// (case-insensitive, since hostnames are case-insensitive per RFC 4343).
#[must_use]
pub fn domain_in_set(domain: &str, set: &[String]) -> bool {
    set.iter().any(|d| d.eq_ignore_ascii_case(domain))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_glob_basic() {
        assert!(name_glob_match("*", "anything"));
        assert!(name_glob_match("rm", "rm"));
        assert!(!name_glob_match("rm", "rmdir"));
        assert!(name_glob_match("git-*", "git-clone"));
        assert!(name_glob_match("*_tool", "execute_tool"));
        assert!(name_glob_match("do_*_now", "do_it_now"));
    }

    #[test]
    fn path_glob_single_star_does_not_cross_segments() {
        assert!(path_glob_match("/home/*/file.txt", "/home/alice/file.txt"));
        assert!(!path_glob_match("/home/*/file.txt", "/home/alice/sub/file.txt"));
    }

    #[test]
    fn path_glob_double_star_crosses_segments() {
        assert!(path_glob_match("**/.ssh/**", "/home/alice/.ssh/id_rsa"));
        assert!(path_glob_match("/home/**", "/home/alice/sub/deep/file"));
        assert!(path_glob_match("/home/**", "/home"));
    }

    #[test]
    fn path_glob_exact_no_wildcards() {
        assert!(path_glob_match("/etc/shadow", "/etc/shadow"));
        assert!(!path_glob_match("/etc/shadow", "/etc/shadow2"));
    }

    #[test]
    fn numeric_coercion_rejects_non_numeric() {
        assert_eq!(coerce_number(&serde_json::json!(42)), Some(42.0));
        assert_eq!(coerce_number(&serde_json::json!(42.5)), Some(42.5));
        assert_eq!(coerce_number(&serde_json::json!("42")), None);
        assert_eq!(coerce_number(&serde_json::json!(null)), None);
    }

    #[test]
    fn domain_set_is_case_insensitive() {
        let set = vec!["Example.com".to_string()];
        assert!(domain_in_set("example.com", &set));
        assert!(domain_in_set("EXAMPLE.COM", &set));
        assert!(!domain_in_set("other.com", &set));
    }
}
