//! Token references and typed path lookup

use serde_json::Value;

use crate::Dictionary;

/// Sentinel that marks a string value as a reference.
pub const REFERENCE_PREFIX: char = '$';

/// A string value that points at another token, e.g. `$colors.primary`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TokenRef<'a> {
    raw: &'a str,
    key: &'a str,
}

impl<'a> TokenRef<'a> {
    /// Returns `Some` if `raw` starts with [`REFERENCE_PREFIX`].
    pub fn parse(raw: &'a str) -> Option<Self> {
        let key = raw.strip_prefix(REFERENCE_PREFIX)?;
        Some(Self { raw, key })
    }

    /// The reference exactly as written, prefix included.
    pub fn raw(&self) -> &'a str {
        self.raw
    }

    /// The lookup key, prefix stripped.
    pub fn key(&self) -> &'a str {
        self.key
    }

    pub fn path(&self, allow_dot_path: bool) -> TokenPath<'a> {
        if allow_dot_path {
            TokenPath::dotted(self.key)
        } else {
            TokenPath::bare(self.key)
        }
    }
}

/// Where a token lives: a single top-level key, or a `.`-separated path.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TokenPath<'a> {
    key: &'a str,
    dotted: bool,
}

impl<'a> TokenPath<'a> {
    /// A top-level key. Dots are part of the key.
    pub fn bare(key: &'a str) -> Self {
        Self { key, dotted: false }
    }

    /// A path whose segments are separated by `.`.
    pub fn dotted(key: &'a str) -> Self {
        Self { key, dotted: true }
    }

    /// The full key, also used as the memo key during resolution.
    pub fn key(&self) -> &'a str {
        self.key
    }

    pub fn is_dotted(&self) -> bool {
        self.dotted
    }

    /// Walk `dictionary` along this path.
    ///
    /// Returns `None` for an empty key, a missing segment, or a segment applied
    /// to a value that cannot be indexed (numbers, strings, booleans, null).
    /// Arrays are indexed by canonical decimal segments (`0`, `12`).
    pub fn lookup<'v>(&self, dictionary: &'v Dictionary) -> Option<&'v Value> {
        if self.key.is_empty() {
            return None;
        }
        if !self.dotted {
            return dictionary.get(self.key);
        }

        let mut segments = self.key.split('.');
        let mut current = dictionary.get(segments.next()?)?;
        for segment in segments {
            current = step(current, segment)?;
        }
        Some(current)
    }
}

fn step<'v>(value: &'v Value, segment: &str) -> Option<&'v Value> {
    match value {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => array_index(segment).and_then(|index| items.get(index)),
        _ => None,
    }
}

fn array_index(segment: &str) -> Option<usize> {
    let canonical = !segment.is_empty()
        && segment.bytes().all(|b| b.is_ascii_digit())
        && (segment == "0" || !segment.starts_with('0'));
    if canonical {
        segment.parse().ok()
    } else {
        None
    }
}
