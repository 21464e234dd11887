//! Error types for policy loading and engine compilation.
//!
//! Per the error-handling design: a malformed *pack* is non-fatal data (see
//! [`crate::shell::packs::PackInfo`]), but a malformed base policy or an
//! invalid regex at engine-build time is a hard `Err`.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PolicyLoadError {
    #[error("failed to read policy file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse policy YAML '{path}': {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

#[derive(Debug, Error)]
pub enum EngineBuildError {
    #[error("rule '{rule_id}' has an invalid regex in field '{field}': {source}")]
    InvalidRegex {
        rule_id: String,
        field: &'static str,
        #[source]
        source: regex::Error,
    },
}
