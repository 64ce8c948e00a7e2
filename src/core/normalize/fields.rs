use crate::core::normalize::numeric::coerce_f64;
use serde_json::Value;

/// What a numeric field resolves to when no candidate path yields a value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Missing {
    /// Use `0.0`
    Zero,
    /// Leave the field unset (`null` downstream)
    Null,
}

/// Ordered candidate paths for one canonical numeric field.
///
/// Paths are dotted (`position.szi`); the first present, parseable and
/// finite value wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldChain {
    pub field: &'static str,
    pub paths: &'static [&'static str],
    pub default: Missing,
}

impl FieldChain {
    pub const fn new(field: &'static str, paths: &'static [&'static str], default: Missing) -> Self {
        Self {
            field,
            paths,
            default,
        }
    }

    /// First finite value along the chain, ignoring the default.
    pub fn find(&self, entry: &Value) -> Option<f64> {
        self.paths
            .iter()
            .find_map(|path| lookup(entry, path).and_then(coerce_f64))
    }

    /// Value along the chain, falling back to the documented default.
    pub fn resolve(&self, entry: &Value) -> Option<f64> {
        self.find(entry).or(match self.default {
            Missing::Zero => Some(0.0),
            Missing::Null => None,
        })
    }

    /// Value along the chain, `0.0` when nothing resolves.
    pub fn resolve_or_zero(&self, entry: &Value) -> f64 {
        self.find(entry).unwrap_or(0.0)
    }
}

/// Ordered candidate paths for a textual field (ids, tickers, sides).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextChain {
    pub field: &'static str,
    pub paths: &'static [&'static str],
}

impl TextChain {
    pub const fn new(field: &'static str, paths: &'static [&'static str]) -> Self {
        Self { field, paths }
    }

    /// First non-empty string (numbers are rendered) along the chain.
    pub fn resolve(&self, entry: &Value) -> Option<String> {
        self.paths.iter().find_map(|path| match lookup(entry, path)? {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
    }
}

/// Walk a dotted path through nested objects.
pub fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(value, |current, segment| current.get(segment))
        .filter(|found| !found.is_null())
}

/// The object at the first of `roots` that holds one, else the payload
/// itself when it is an object.
pub fn locate_object<'a>(payload: &'a Value, roots: &[&str]) -> Option<&'a Value> {
    roots
        .iter()
        .filter_map(|root| lookup(payload, root))
        .find(|candidate| candidate.is_object())
        .or_else(|| payload.is_object().then_some(payload))
}
