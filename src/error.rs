//! Error types for grammar loading, zoning and coordinate conversion

use std::path::PathBuf;
use thiserror::Error;

/// Failure while expanding the fragment references of one definition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpansionError {
    /// References were still present after `limit` expansion passes
    #[error("fragment nesting exceeds depth limit of {limit}")]
    TooDeep { limit: usize },
    /// A reference names a fragment that was never defined
    #[error("reference to unknown fragment '{name}'")]
    UnknownFragment { name: String },
}

/// A definition's expanded source is not a valid regular expression.
#[derive(Debug, Clone, Error)]
#[error("invalid regex pattern: {message}")]
pub struct PatternError {
    pub message: String,
}

/// Load-time failures. Any of these leaves no usable grammar behind.
#[derive(Debug, Error)]
pub enum GrammarError {
    #[error("cannot read grammar file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed YAML grammar: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("malformed JSON grammar: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported grammar format '{0}' (expected .yaml, .yml or .json)")]
    UnsupportedFormat(String),

    #[error("definition '{label}' references unknown fragment '{fragment}'")]
    UnknownFragment { label: String, fragment: String },

    #[error("definition '{label}' does not compile: {source}")]
    InvalidPattern {
        label: String,
        #[source]
        source: PatternError,
    },
}

/// Conversion between byte offsets and (line, token) coordinates failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoordinateError {
    #[error("offset {offset} is outside the document (length {len})")]
    OffsetOutOfBounds { offset: usize, len: usize },
    #[error("no token {token} on line {line}")]
    PositionNotFound { line: usize, token: usize },
}

/// Per-document failures. These never touch the shared grammar.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ZoningError {
    #[error("deadline passed before matching '{label}'")]
    Deadline { label: String },
    #[error(transparent)]
    Coordinate(#[from] CoordinateError),
}
