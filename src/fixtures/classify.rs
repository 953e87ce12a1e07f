use serde_json::Value;

/// Structural classification of an API response payload.
///
/// Upstream endpoints answer with several shapes depending on the route and
/// its filters; ingestion only cares whether it is looking at a list of
/// records or a single one.
#[derive(Debug, Clone, PartialEq)]
pub enum PayloadShape<'a> {
    /// A list of records: a bare array, or one wrapped in `data`/`results`.
    List(&'a [Value]),
    /// A single record, recognized by an id-like key (`id` or `_id`).
    Single(&'a Value),
    /// Anything else. Ingestion ignores these without raising.
    Unrecognized,
}

/// Classify a payload by structural inspection, in precedence order:
/// bare array, array-valued `data`, array-valued `results`, id-carrying
/// object. A `data`/`results` key that is not array-valued does not match.
pub fn classify(payload: &Value) -> PayloadShape<'_> {
    if let Some(items) = payload.as_array() {
        return PayloadShape::List(items);
    }

    for key in ["data", "results"] {
        if let Some(items) = payload.get(key).and_then(Value::as_array) {
            return PayloadShape::List(items);
        }
    }

    if payload.get("id").is_some() || payload.get("_id").is_some() {
        return PayloadShape::Single(payload);
    }

    PayloadShape::Unrecognized
}
