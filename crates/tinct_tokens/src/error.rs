use std::path::PathBuf;

use thiserror::Error;

use crate::token_set::MAX_TOKENS;

/// Terminal failures of a single resolution call.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    /// Evaluating `key` re-entered a token that is still being evaluated.
    #[error(
        "cycle detected resolving `{key}` via `{reference}`: {}",
        .chain.join(" -> ")
    )]
    Cycle {
        key: String,
        reference: String,
        /// Active evaluation stack, ending with the repeated key.
        chain: Vec<String>,
    },

    /// Strict mode only.
    #[error("unresolved token reference `{reference}` (no token at `{key}`)")]
    Unresolved { reference: String, key: String },

    /// References and nesting below `key` exceed `limit` levels.
    #[error("token `{key}` nests references or values deeper than {limit} levels")]
    TooDeep { key: String, limit: usize },
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read token file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("json token document error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("yaml token document error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("toml token document error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("token document root must be a mapping, found {found}")]
    NotAMapping { found: &'static str },

    #[error(
        "unsupported token file format for {} (expected .json, .yaml, .yml or .toml)",
        .0.display()
    )]
    UnsupportedFormat(PathBuf),

    #[error("token document has too many entries (max {})", MAX_TOKENS)]
    TooManyTokens,

    #[error("token keys must be non-empty")]
    EmptyKey,
}
