//! Depth-first token resolution
//!
//! Every token is evaluated at most once per call: the first dereference
//! resolves its raw value (dependencies first) and memoizes the result, later
//! dereferences reuse it. Tokens currently being evaluated sit on an active
//! stack; reaching one of them again is a cycle.
//!
//! All working state lives in a context created per call, so
//! concurrent resolutions never share anything.

use indexmap::IndexSet;
use rustc_hash::{FxBuildHasher, FxHashMap};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::error::ResolveError;
use crate::reference::{TokenPath, TokenRef};
use crate::source::TokenSource;
use crate::Dictionary;

type FxIndexSet<T> = IndexSet<T, FxBuildHasher>;

/// Deepest combined reference chain and container nesting one resolution may
/// walk before failing with [`ResolveError::TooDeep`].
pub const MAX_RESOLVE_DEPTH: usize = 256;

/// Resolution flags. Every field is optional when deserialized.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ResolveOptions {
    /// Missing references are errors (otherwise left as-is).
    pub strict: bool,
    /// References may address nested values with `.` paths.
    pub allow_dot_path: bool,
    /// Record the dependency-first order of evaluated tokens.
    pub collect_topo_order: bool,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            strict: true,
            allow_dot_path: false,
            collect_topo_order: false,
        }
    }
}

impl ResolveOptions {
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn with_dot_path(mut self, allow_dot_path: bool) -> Self {
        self.allow_dot_path = allow_dot_path;
        self
    }

    pub fn with_topo_order(mut self, collect_topo_order: bool) -> Self {
        self.collect_topo_order = collect_topo_order;
        self
    }
}

/// Output of [`resolve`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Resolution {
    /// Same shape as the input, with every reference replaced.
    pub resolved: Dictionary,
    /// Present only when `collect_topo_order` was set. Each key appears once,
    /// after every key it depends on.
    pub topo_order: Option<Vec<String>>,
}

/// Resolve every reference in `dictionary`.
pub fn resolve(dictionary: &Dictionary, options: &ResolveOptions) -> Result<Resolution, ResolveError> {
    resolve_source(dictionary, options)
}

/// Resolve every top-level token of `source`.
///
/// Top-level entries are evaluated as tokens in their own right, so they are
/// memoized and recorded in the topological order like any referenced token.
/// With dot paths enabled, a top-level key that itself contains `.` is not
/// addressable by reference; its value is resolved without being memoized.
pub fn resolve_source<S>(source: &S, options: &ResolveOptions) -> Result<Resolution, ResolveError>
where
    S: TokenSource + ?Sized,
{
    let mut ctx = ResolveContext::new(source, *options);
    let mut resolved = Dictionary::new();

    for key in source.keys() {
        let value = if options.allow_dot_path && key.contains('.') {
            match source.lookup(&TokenPath::bare(key)) {
                Some(raw) => ctx.resolve_value(raw)?,
                None => continue,
            }
        } else {
            match ctx.evaluate(&TokenPath::bare(key), key)? {
                Some(value) => value,
                None => continue,
            }
        };
        resolved.insert(key.to_string(), value);
    }

    debug!(
        tokens = resolved.len(),
        evaluated = ctx.memo.len(),
        strict = options.strict,
        "resolved token dictionary"
    );

    let topo_order = options
        .collect_topo_order
        .then(|| ctx.order.into_iter().collect());

    Ok(Resolution {
        resolved,
        topo_order,
    })
}

/// Per-call working state.
struct ResolveContext<'s, S: ?Sized> {
    source: &'s S,
    options: ResolveOptions,
    /// Fully resolved tokens by key.
    memo: FxHashMap<String, Value>,
    /// Keys under evaluation, outermost first.
    active: FxIndexSet<String>,
    /// Keys in the order they finished resolving.
    order: FxIndexSet<String>,
    /// Nested `resolve_value` calls currently on the stack.
    depth: usize,
}

impl<'s, S> ResolveContext<'s, S>
where
    S: TokenSource + ?Sized,
{
    fn new(source: &'s S, options: ResolveOptions) -> Self {
        Self {
            source,
            options,
            memo: FxHashMap::default(),
            active: FxIndexSet::default(),
            order: FxIndexSet::default(),
            depth: 0,
        }
    }

    /// Deep-resolve a raw value. Non-reference scalars pass through.
    fn resolve_value(&mut self, value: &Value) -> Result<Value, ResolveError> {
        if self.depth >= MAX_RESOLVE_DEPTH {
            return Err(ResolveError::TooDeep {
                key: self.active.last().cloned().unwrap_or_default(),
                limit: MAX_RESOLVE_DEPTH,
            });
        }
        self.depth += 1;
        let result = self.resolve_nested(value);
        self.depth -= 1;
        result
    }

    fn resolve_nested(&mut self, value: &Value) -> Result<Value, ResolveError> {
        match value {
            Value::String(text) => match TokenRef::parse(text) {
                Some(reference) => self.dereference(reference),
                None => Ok(value.clone()),
            },
            Value::Array(items) => items
                .iter()
                .map(|item| self.resolve_value(item))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            Value::Object(map) => {
                let mut out = Dictionary::with_capacity(map.len());
                for (key, item) in map {
                    out.insert(key.clone(), self.resolve_value(item)?);
                }
                Ok(Value::Object(out))
            }
            _ => Ok(value.clone()),
        }
    }

    fn dereference(&mut self, reference: TokenRef<'_>) -> Result<Value, ResolveError> {
        let path = reference.path(self.options.allow_dot_path);
        match self.evaluate(&path, reference.raw())? {
            Some(value) => Ok(value),
            None if self.options.strict => Err(ResolveError::Unresolved {
                reference: reference.raw().to_string(),
                key: path.key().to_string(),
            }),
            None => {
                warn!(reference = reference.raw(), "leaving unresolved token reference in place");
                Ok(Value::String(reference.raw().to_string()))
            }
        }
    }

    /// Resolve the token at `path`, or `None` if the source has no such token.
    fn evaluate(&mut self, path: &TokenPath<'_>, reference: &str) -> Result<Option<Value>, ResolveError> {
        let key = path.key();
        if let Some(value) = self.memo.get(key) {
            return Ok(Some(value.clone()));
        }
        if self.active.contains(key) {
            let mut chain: Vec<String> = self.active.iter().cloned().collect();
            chain.push(key.to_string());
            return Err(ResolveError::Cycle {
                key: key.to_string(),
                reference: reference.to_string(),
                chain,
            });
        }

        let source = self.source;
        let Some(raw) = source.lookup(path) else {
            return Ok(None);
        };

        self.active.insert(key.to_string());
        let result = self.resolve_value(raw);
        self.active.pop();
        let value = result?;

        trace!(token = key, "memoized token");
        self.memo.insert(key.to_string(), value.clone());
        if self.options.collect_topo_order {
            self.order.insert(key.to_string());
        }
        Ok(Some(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn dict(value: Value) -> Dictionary {
        match value {
            Value::Object(map) => map,
            _ => panic!("fixture must be an object"),
        }
    }

    #[test]
    fn default_options() {
        let options = ResolveOptions::default();
        assert!(options.strict);
        assert!(!options.allow_dot_path);
        assert!(!options.collect_topo_order);
    }

    #[test]
    fn options_deserialize_with_defaults() {
        let options: ResolveOptions = serde_json::from_value(json!({ "allow_dot_path": true })).unwrap();
        assert_eq!(options, ResolveOptions::default().with_dot_path(true));
    }

    #[test]
    fn plain_values_pass_through() {
        let tokens = dict(json!({
            "size": 4,
            "enabled": true,
            "none": null,
            "label": "primary$",
            "nested": { "list": [1, "two", { "three": 3.5 }] },
        }));
        let resolution = resolve(&tokens, &ResolveOptions::default()).unwrap();
        assert_eq!(resolution.resolved, tokens);
        assert_eq!(resolution.topo_order, None);
    }

    #[test]
    fn shared_dependency_is_recorded_once() {
        let tokens = dict(json!({ "x": "$base", "y": "$base", "base": 2 }));
        let resolution = resolve(&tokens, &ResolveOptions::default().with_topo_order(true)).unwrap();
        assert_eq!(resolution.resolved, dict(json!({ "x": 2, "y": 2, "base": 2 })));
        assert_eq!(resolution.topo_order.unwrap(), vec!["base", "x", "y"]);
    }

    #[test]
    fn self_reference_is_a_cycle() {
        let tokens = dict(json!({ "a": "$a" }));
        let err = resolve(&tokens, &ResolveOptions::default()).unwrap_err();
        assert_eq!(
            err,
            ResolveError::Cycle {
                key: "a".to_string(),
                reference: "$a".to_string(),
                chain: vec!["a".to_string(), "a".to_string()],
            }
        );
    }

    #[test]
    fn cycle_chain_lists_active_tokens() {
        let tokens = dict(json!({ "a": "$b", "b": ["$c"], "c": { "inner": "$a" } }));
        let err = resolve(&tokens, &ResolveOptions::default().with_strict(false)).unwrap_err();
        match err {
            ResolveError::Cycle { key, reference, chain } => {
                assert_eq!(key, "a");
                assert_eq!(reference, "$a");
                assert_eq!(chain, vec!["a", "b", "c", "a"]);
            }
            other => panic!("expected cycle, got {other:?}"),
        }
    }

    #[test]
    fn bare_prefix_is_missing() {
        let tokens = dict(json!({ "a": "$" }));
        let err = resolve(&tokens, &ResolveOptions::default()).unwrap_err();
        assert_eq!(
            err,
            ResolveError::Unresolved {
                reference: "$".to_string(),
                key: String::new(),
            }
        );

        let lenient = resolve(&tokens, &ResolveOptions::default().with_strict(false)).unwrap();
        assert_eq!(lenient.resolved, tokens);
    }

    #[test]
    fn missing_reference_is_not_recorded() {
        let tokens = dict(json!({ "a": "$missing" }));
        let options = ResolveOptions::default().with_strict(false).with_topo_order(true);
        let resolution = resolve(&tokens, &options).unwrap();
        assert_eq!(resolution.topo_order.unwrap(), vec!["a"]);
    }

    #[test]
    fn dot_path_references_are_memoized_by_path() {
        let tokens = dict(json!({
            "colors": { "primary": "blue", "accent": "$colors.primary" },
            "link": "$colors.accent",
        }));
        let options = ResolveOptions::default().with_dot_path(true).with_topo_order(true);
        let resolution = resolve(&tokens, &options).unwrap();
        assert_eq!(resolution.resolved["link"], json!("blue"));
        assert_eq!(resolution.resolved["colors"]["accent"], json!("blue"));
        assert_eq!(
            resolution.topo_order.unwrap(),
            vec!["colors.primary", "colors", "colors.accent", "link"]
        );
    }

    #[test]
    fn dot_path_into_own_container_is_a_cycle() {
        let tokens = dict(json!({ "colors": { "primary": "$colors" } }));
        let err = resolve(&tokens, &ResolveOptions::default().with_dot_path(true)).unwrap_err();
        assert!(matches!(err, ResolveError::Cycle { ref key, .. } if key == "colors"));
    }

    #[test]
    fn dotted_top_level_key_resolves_without_memo() {
        let tokens = dict(json!({
            "spacing": { "md": 8 },
            "spacing.lg": "$spacing.md",
        }));
        let options = ResolveOptions::default().with_dot_path(true).with_topo_order(true);
        let resolution = resolve(&tokens, &options).unwrap();
        assert_eq!(resolution.resolved["spacing.lg"], json!(8));
        assert_eq!(resolution.topo_order.unwrap(), vec!["spacing", "spacing.md"]);
    }

    fn chain(len: usize) -> Dictionary {
        let mut tokens = Dictionary::new();
        for i in 0..len {
            tokens.insert(format!("t{i}"), Value::String(format!("$t{}", i + 1)));
        }
        tokens.insert(format!("t{len}"), json!(1));
        tokens
    }

    #[test]
    fn long_chains_within_the_limit_resolve() {
        let tokens = chain(MAX_RESOLVE_DEPTH - 1);
        let resolution = resolve(&tokens, &ResolveOptions::default()).unwrap();
        assert_eq!(resolution.resolved["t0"], json!(1));
    }

    #[test]
    fn overly_deep_chain_is_an_error() {
        for len in [MAX_RESOLVE_DEPTH, 2_000, 50_000] {
            let err = resolve(&chain(len), &ResolveOptions::default()).unwrap_err();
            match err {
                ResolveError::TooDeep { key, limit } => {
                    assert_eq!(limit, MAX_RESOLVE_DEPTH);
                    assert_eq!(key, format!("t{MAX_RESOLVE_DEPTH}"));
                }
                other => panic!("expected depth error for len={len}, got {other:?}"),
            }
        }
    }

    #[test]
    fn overly_deep_nesting_is_an_error() {
        let mut value = json!("leaf");
        for _ in 0..MAX_RESOLVE_DEPTH + 10 {
            value = Value::Array(vec![value]);
        }
        let mut tokens = Dictionary::new();
        tokens.insert("nested".to_string(), value);
        let err = resolve(&tokens, &ResolveOptions::default()).unwrap_err();
        assert!(matches!(err, ResolveError::TooDeep { ref key, .. } if key == "nested"));
    }

    #[test]
    fn input_is_left_untouched() {
        let tokens = dict(json!({ "a": "$b", "b": 1 }));
        let before = tokens.clone();
        let _ = resolve(&tokens, &ResolveOptions::default()).unwrap();
        assert_eq!(tokens, before);
    }
}
