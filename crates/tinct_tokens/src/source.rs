//! Read access to raw tokens

use serde_json::Value;

use crate::reference::TokenPath;
use crate::Dictionary;

/// A store of raw (unresolved) tokens.
///
/// The resolver only reads through this trait, so any map-like store can be
/// resolved without first copying it into a [`Dictionary`].
pub trait TokenSource {
    /// Look up the raw value at `path`, or `None` if it does not exist.
    fn lookup(&self, path: &TokenPath<'_>) -> Option<&Value>;

    /// Top-level keys in iteration order.
    fn keys(&self) -> impl Iterator<Item = &str>;
}

impl TokenSource for Dictionary {
    fn lookup(&self, path: &TokenPath<'_>) -> Option<&Value> {
        path.lookup(self)
    }

    fn keys(&self) -> impl Iterator<Item = &str> {
        self.iter().map(|(key, _)| key.as_str())
    }
}
