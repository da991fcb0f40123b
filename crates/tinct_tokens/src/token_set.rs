//! Loading and layering token documents

use std::fs;
use std::path::Path;

use serde_json::Value;
use tracing::debug;

use crate::error::{LoadError, ResolveError};
use crate::reference::TokenPath;
use crate::resolver::{resolve_source, Resolution, ResolveOptions};
use crate::source::TokenSource;
use crate::Dictionary;

/// Upper bound on top-level entries in one token document.
pub const MAX_TOKENS: usize = 10_000;

/// Serialization formats understood by [`TokenSet`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokenFormat {
    Json,
    Yaml,
    Toml,
}

impl TokenFormat {
    /// Pick a format from a file extension (`json`, `yaml`, `yml`, `toml`).
    pub fn from_path(path: &Path) -> Result<Self, LoadError> {
        let ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        match ext.as_str() {
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            "toml" => Ok(Self::Toml),
            _ => Err(LoadError::UnsupportedFormat(path.to_path_buf())),
        }
    }

    pub fn parse(self, src: &str) -> Result<TokenSet, LoadError> {
        let root: Value = match self {
            Self::Json => serde_json::from_str(src)?,
            Self::Yaml => serde_yaml::from_str(src)?,
            Self::Toml => toml_to_json(toml::Value::Table(toml::from_str(src)?)),
        };
        TokenSet::from_value(root)
    }
}

/// An unresolved token dictionary.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TokenSet {
    tokens: Dictionary,
}

impl TokenSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(src: &str) -> Result<Self, LoadError> {
        TokenFormat::Json.parse(src)
    }

    pub fn from_yaml_str(src: &str) -> Result<Self, LoadError> {
        TokenFormat::Yaml.parse(src)
    }

    pub fn from_toml_str(src: &str) -> Result<Self, LoadError> {
        TokenFormat::Toml.parse(src)
    }

    /// Load a token file, choosing the format from its extension.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let format = TokenFormat::from_path(path)?;
        let src = fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let set = format.parse(&src)?;
        debug!(path = %path.display(), tokens = set.len(), "loaded token file");
        Ok(set)
    }

    /// Wrap a document root, which must be a mapping.
    pub fn from_value(root: Value) -> Result<Self, LoadError> {
        let tokens = match root {
            Value::Object(map) => map,
            other => {
                return Err(LoadError::NotAMapping {
                    found: value_kind(&other),
                })
            }
        };
        if tokens.len() > MAX_TOKENS {
            return Err(LoadError::TooManyTokens);
        }
        if tokens.keys().any(|key| key.is_empty()) {
            return Err(LoadError::EmptyKey);
        }
        Ok(Self { tokens })
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.tokens.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.tokens.get(key)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn tokens(&self) -> &Dictionary {
        &self.tokens
    }

    pub fn into_inner(self) -> Dictionary {
        self.tokens
    }

    /// Deep-merge `overrides` over this set.
    ///
    /// Objects present on both sides merge key by key; any other override value
    /// replaces the base value. Existing keys keep their position.
    pub fn layer(&mut self, overrides: TokenSet) {
        merge_into(&mut self.tokens, overrides.tokens);
    }

    pub fn resolve(&self, options: &ResolveOptions) -> Result<Resolution, ResolveError> {
        resolve_source(self, options)
    }
}

impl TokenSource for TokenSet {
    fn lookup(&self, path: &TokenPath<'_>) -> Option<&Value> {
        path.lookup(&self.tokens)
    }

    fn keys(&self) -> impl Iterator<Item = &str> {
        self.tokens.keys().map(String::as_str)
    }
}

impl From<Dictionary> for TokenSet {
    fn from(tokens: Dictionary) -> Self {
        Self { tokens }
    }
}

fn merge_into(base: &mut Dictionary, overrides: Dictionary) {
    for (key, value) in overrides {
        if let Value::Object(incoming) = value {
            if let Some(Value::Object(existing)) = base.get_mut(&key) {
                merge_into(existing, incoming);
                continue;
            }
            base.insert(key, Value::Object(incoming));
        } else {
            base.insert(key, value);
        }
    }
}

/// TOML datetimes have no JSON counterpart; they become RFC 3339 strings.
fn toml_to_json(value: toml::Value) -> Value {
    match value {
        toml::Value::String(text) => Value::String(text),
        toml::Value::Integer(n) => Value::from(n),
        toml::Value::Float(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(f.to_string())),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(datetime) => Value::String(datetime.to_string()),
        toml::Value::Array(items) => Value::Array(items.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .into_iter()
                .map(|(key, item)| (key, toml_to_json(item)))
                .collect(),
        ),
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "a mapping",
    }
}

/// Flatten a dictionary into `(dot.path, leaf)` pairs.
///
/// Array elements are addressed by index, so every path is a valid dot-path
/// reference. Empty objects and arrays are kept as leaves.
pub fn flatten(dictionary: &Dictionary) -> Vec<(String, Value)> {
    let mut out = Vec::new();
    for (key, value) in dictionary {
        flatten_into(key.clone(), value, &mut out);
    }
    out
}

fn flatten_into(prefix: String, value: &Value, out: &mut Vec<(String, Value)>) {
    match value {
        Value::Object(map) if !map.is_empty() => {
            for (key, item) in map {
                flatten_into(format!("{prefix}.{key}"), item, out);
            }
        }
        Value::Array(items) if !items.is_empty() => {
            for (index, item) in items.iter().enumerate() {
                flatten_into(format!("{prefix}.{index}"), item, out);
            }
        }
        _ => out.push((prefix, value.clone())),
    }
}
