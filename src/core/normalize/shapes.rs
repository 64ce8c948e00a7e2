use crate::core::normalize::fields::lookup;
use crate::core::types::Exchange;
use serde_json::Value;
use std::fmt;
use tracing::warn;

/// One way a collection can be nested inside a payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// The payload itself is an array of objects
    TopLevel,
    /// Array of objects at a dotted path (`data`, `data.resultList`)
    Path(&'static str),
    /// `[null, [..]]` or `[null, {..}, {..}]`
    NullWrapped,
    /// Object at a dotted path whose values are the entries
    ObjectValues(&'static str),
}

impl Shape {
    /// Entries of this shape, or `None` when the payload is nested differently.
    /// An empty array is a match.
    pub fn extract<'a>(&self, payload: &'a Value) -> Option<Vec<&'a Value>> {
        match self {
            Self::TopLevel => {
                let items = payload.as_array()?;
                items.iter().all(Value::is_object).then(|| items.iter().collect())
            }
            Self::Path(path) => {
                let items = lookup(payload, path)?.as_array()?;
                Some(items.iter().filter(|v| v.is_object()).collect())
            }
            Self::NullWrapped => {
                let items = payload.as_array()?;
                let (first, rest) = items.split_first()?;
                if !first.is_null() {
                    return None;
                }
                match rest {
                    [Value::Array(inner)] => Some(inner.iter().filter(|v| v.is_object()).collect()),
                    _ => Some(rest.iter().filter(|v| v.is_object()).collect()),
                }
            }
            Self::ObjectValues(path) => {
                let object = lookup(payload, path)?.as_object()?;
                Some(object.values().filter(|v| v.is_object()).collect())
            }
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TopLevel => write!(f, "[..]"),
            Self::Path(path) => write!(f, ".{}", path),
            Self::NullWrapped => write!(f, "[null, ..]"),
            Self::ObjectValues(path) => write!(f, ".{}{{*}}", path),
        }
    }
}

/// A payload matched none of the shapes documented for a collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizationGap {
    pub exchange: Exchange,
    pub collection: &'static str,
    pub reason: String,
}

impl fmt::Display for NormalizationGap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {}", self.exchange, self.collection, self.reason)
    }
}

/// Try each shape in order; the first match wins.
pub fn try_discover<'a>(
    exchange: Exchange,
    collection: &'static str,
    shapes: &[Shape],
    payload: &'a Value,
) -> Result<Vec<&'a Value>, NormalizationGap> {
    shapes
        .iter()
        .find_map(|shape| shape.extract(payload))
        .ok_or_else(|| NormalizationGap {
            exchange,
            collection,
            reason: format!(
                "payload matched none of [{}]",
                shapes.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
            ),
        })
}

/// Like `try_discover`, but an unknown shape yields an empty list and a warning.
pub fn discover<'a>(
    exchange: Exchange,
    collection: &'static str,
    shapes: &[Shape],
    payload: &'a Value,
) -> Vec<&'a Value> {
    try_discover(exchange, collection, shapes, payload).unwrap_or_else(|gap| {
        warn!(exchange = %gap.exchange, collection = gap.collection, "Normalization gap: {}", gap.reason);
        Vec::new()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SHAPES: &[Shape] = &[
        Shape::TopLevel,
        Shape::Path("positions"),
        Shape::Path("data"),
        Shape::NullWrapped,
    ];

    #[test]
    fn test_every_shape_yields_the_same_entries() {
        let entry = json!({"symbol": "BTCUSDT", "positionAmt": "0.5"});
        let payloads = [
            json!([entry.clone()]),
            json!({"positions": [entry.clone()]}),
            json!({"data": [entry.clone()]}),
            json!([null, [entry.clone()]]),
            json!([null, entry.clone()]),
        ];
        for payload in &payloads {
            let found = discover(Exchange::Aster, "positions", SHAPES, payload);
            assert_eq!(found, vec![&entry], "payload {payload}");
        }
    }

    #[test]
    fn test_empty_array_is_a_match() {
        let payload = json!({"data": []});
        assert_eq!(try_discover(Exchange::Mexc, "positions", SHAPES, &payload), Ok(vec![]));
    }

    #[test]
    fn test_unknown_shape_is_a_gap_not_an_error() {
        let payload = json!({"result": {"rows": []}});
        let gap = try_discover(Exchange::Mexc, "positions", SHAPES, &payload).unwrap_err();
        assert_eq!(gap.collection, "positions");
        assert!(gap.reason.contains(".data"));
        assert!(discover(Exchange::Mexc, "positions", SHAPES, &payload).is_empty());
    }

    #[test]
    fn test_null_wrapper_does_not_match_top_level() {
        let payload = json!([null, [{"a": 1}]]);
        assert_eq!(Shape::TopLevel.extract(&payload), None);
    }

    #[test]
    fn test_object_values() {
        let payload = json!({"accounts": {"flex": {"pv": 1}, "cash": {"pv": 2}}});
        let found = Shape::ObjectValues("accounts").extract(&payload).unwrap();
        assert_eq!(found.len(), 2);
    }
}
