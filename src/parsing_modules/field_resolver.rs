//! Structured path lookups against an embedded state tree.
//!
//! Paths use a small JSONPath-like syntax:
//!
//! ```text
//! $.jss.sitecore.route.placeholders.arrow-main[2].fields.results
//! ```
//!
//! - `$` is the root and must come first
//! - `.key` descends into an object (keys may contain `-`)
//! - `[n]` indexes into an array
//! - a trailing `[:]` (or `.[:]`) selects the whole array and is a no-op
//!
//! Two access flavors exist. [`strict`] reports a missing path as an error and
//! is reserved for values a job cannot proceed without. The `lenient_*`
//! accessors never fail: a missing path or a value of the wrong JSON type
//! degrades to an empty string, zero, or an empty slice.

use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// One step of a parsed [`FieldPath`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Key(String),
    Index(usize),
}

/// A parsed path expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    raw: String,
    segments: Vec<Segment>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathParseError {
    #[error("path must start with '$': {0}")]
    MissingRoot(String),

    #[error("empty key at byte {position} in {path}")]
    EmptyKey { path: String, position: usize },

    #[error("unclosed '[' in {0}")]
    UnclosedBracket(String),

    #[error("invalid array index '{index}' in {path}")]
    InvalidIndex { path: String, index: String },

    #[error("whole-array selector must be the last segment in {0}")]
    SelectorNotLast(String),

    #[error("unexpected character '{ch}' in {path}")]
    UnexpectedChar { path: String, ch: char },
}

/// Lookup failure for [`strict`] accesses.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("path not found: {path}")]
    PathNotFound { path: String },
}

impl FieldPath {
    /// Single-key path relative to the value it is applied to, e.g. `$.partId`.
    pub fn key(name: &str) -> Self {
        Self {
            raw: format!("$.{}", name),
            segments: vec![Segment::Key(name.to_string())],
        }
    }

    /// Extend this path with another object key.
    pub fn join(&self, name: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(Segment::Key(name.to_string()));
        Self {
            raw: format!("{}.{}", self.raw, name),
            segments,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Walk the tree. `None` when any step is missing or has the wrong shape.
    pub fn lookup<'v>(&self, root: &'v Value) -> Option<&'v Value> {
        self.segments.iter().try_fold(root, |node, segment| match segment {
            Segment::Key(key) => node.get(key.as_str()),
            Segment::Index(index) => node.get(*index),
        })
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for FieldPath {
    type Err = PathParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        let body = raw
            .strip_prefix('$')
            .ok_or_else(|| PathParseError::MissingRoot(raw.to_string()))?;

        let mut segments = Vec::new();
        let mut chars = body.char_indices().peekable();
        let mut saw_selector = false;

        while let Some((position, ch)) = chars.next() {
            if saw_selector {
                return Err(PathParseError::SelectorNotLast(raw.to_string()));
            }
            match ch {
                '.' => {
                    // `.[:]` is the same as `[:]`
                    if matches!(chars.peek(), Some((_, '['))) {
                        continue;
                    }
                    let mut key = String::new();
                    while let Some(&(_, next)) = chars.peek() {
                        if next == '.' || next == '[' {
                            break;
                        }
                        key.push(next);
                        chars.next();
                    }
                    if key.is_empty() {
                        return Err(PathParseError::EmptyKey {
                            path: raw.to_string(),
                            position: position + 1,
                        });
                    }
                    segments.push(Segment::Key(key));
                }
                '[' => {
                    let mut inner = String::new();
                    let mut closed = false;
                    for (_, next) in chars.by_ref() {
                        if next == ']' {
                            closed = true;
                            break;
                        }
                        inner.push(next);
                    }
                    if !closed {
                        return Err(PathParseError::UnclosedBracket(raw.to_string()));
                    }
                    let inner = inner.trim();
                    if inner == ":" || inner == "*" {
                        saw_selector = true;
                    } else {
                        let index = inner.parse::<usize>().map_err(|_| {
                            PathParseError::InvalidIndex {
                                path: raw.to_string(),
                                index: inner.to_string(),
                            }
                        })?;
                        segments.push(Segment::Index(index));
                    }
                }
                other => {
                    return Err(PathParseError::UnexpectedChar {
                        path: raw.to_string(),
                        ch: other,
                    })
                }
            }
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }
}

/// Name of a value's JSON type, for diagnostics.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Only JSON strings coerce to a string.
pub fn as_string(value: &Value) -> Option<&str> {
    value.as_str()
}

/// Only JSON numbers coerce to a number.
pub fn as_number(value: &Value) -> Option<f64> {
    value.as_f64()
}

pub fn as_array(value: &Value) -> Option<&[Value]> {
    value.as_array().map(Vec::as_slice)
}

/// Lookup whose absence is an error.
pub fn strict<'v>(root: &'v Value, path: &FieldPath) -> Result<&'v Value, ResolveError> {
    path.lookup(root).ok_or_else(|| ResolveError::PathNotFound {
        path: path.to_string(),
    })
}

/// String at `path`, or `""` when absent or not a string.
pub fn lenient_str(root: &Value, path: &FieldPath) -> String {
    match path.lookup(root) {
        Some(value) => match as_string(value) {
            Some(s) => s.to_string(),
            None => {
                tracing::trace!(path = %path, found = json_type_name(value), "expected string");
                String::new()
            }
        },
        None => String::new(),
    }
}

/// Number at `path`, or `0.0` when absent or not a number.
pub fn lenient_f64(root: &Value, path: &FieldPath) -> f64 {
    path.lookup(root).map(coerce_f64).unwrap_or_default()
}

/// Array at `path`, or an empty slice when absent or not an array.
pub fn lenient_array<'v>(root: &'v Value, path: &FieldPath) -> &'v [Value] {
    match path.lookup(root) {
        Some(value) => as_array(value).unwrap_or_else(|| {
            tracing::trace!(path = %path, found = json_type_name(value), "expected array");
            &[]
        }),
        None => &[],
    }
}

/// Number coercion with the lenient zero default.
pub fn coerce_f64(value: &Value) -> f64 {
    as_number(value).unwrap_or_else(|| {
        tracing::trace!(found = json_type_name(value), "expected number");
        0.0
    })
}
