//! Tinct Design Tokens
//!
//! Resolves design-token dictionaries whose values may point at other tokens.
//!
//! # Overview
//!
//! A token dictionary is a JSON-like mapping. Any string value that starts with
//! `$` is a **reference** to another token:
//!
//! ```json
//! {
//!   "spacing": { "md": 8, "lg": "$spacing.md" },
//!   "accent": "$primary",
//!   "primary": "#3366ff"
//! }
//! ```
//!
//! [`resolve`] replaces every reference, at any depth, with the value it points
//! to. Chains are followed transitively, each token is evaluated once, cycles
//! are reported as errors and the dependency-first evaluation order can be
//! collected on request.
//!
//! # Quick Start
//!
//! ```rust
//! use serde_json::json;
//! use tinct_tokens::{resolve, Dictionary, ResolveOptions};
//!
//! let tokens: Dictionary = serde_json::from_value(json!({
//!     "a": "$b",
//!     "b": "$c",
//!     "c": 5,
//! }))
//! .unwrap();
//!
//! let resolution = resolve(&tokens, &ResolveOptions::default().with_topo_order(true)).unwrap();
//! assert_eq!(resolution.resolved["a"], json!(5));
//! assert_eq!(resolution.topo_order.unwrap(), ["c", "b", "a"]);
//! ```
//!
//! # Options
//!
//! - `strict` (default `true`): a missing reference is an error. When disabled
//!   the reference text is kept as the resolved value.
//! - `allow_dot_path` (default `false`): references may walk into nested
//!   objects and arrays (`$colors.primary.light`, `$palette.0`).
//! - `collect_topo_order` (default `false`): also return the order in which
//!   tokens finished resolving.
//!
//! # Token sets
//!
//! [`TokenSet`] loads dictionaries from JSON, YAML or TOML and layers user
//! overrides over a base set before resolution.

mod error;
mod reference;
mod resolver;
mod source;
mod token_set;

/// A token dictionary: string keys to JSON-like values, in insertion order.
pub type Dictionary = serde_json::Map<String, serde_json::Value>;

pub use error::{LoadError, ResolveError};
pub use reference::{TokenPath, TokenRef, REFERENCE_PREFIX};
pub use resolver::{resolve, resolve_source, Resolution, ResolveOptions, MAX_RESOLVE_DEPTH};
pub use source::TokenSource;
pub use token_set::{flatten, TokenFormat, TokenSet, MAX_TOKENS};
pub use serde_json::Value;
