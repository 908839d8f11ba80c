//! Small helpers over `ciborium::Value`.

use ba_common::{ErrorAccumulator, ErrorCode, ErrorVisibility};
use ciborium::Value;

use crate::constants::invalid_type_error;

/// CBOR type name as surfaced in client error messages.
pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Integer(i) if i128::from(*i) >= 0 => "positive int",
        Value::Integer(_) => "negative int",
        Value::Bytes(_) => "bytestring",
        Value::Text(_) => "string",
        Value::Array(_) => "array",
        Value::Map(_) => "map",
        Value::Bool(_) => "bool",
        Value::Float(_) => "float",
        Value::Null => "null",
        Value::Tag(..) => "tag",
        _ => "unknown",
    }
}

/// Reports a type mismatch for `field` and returns `None`; returns the
/// extracted value otherwise. One helper per expected type keeps the decode
/// loops flat.
pub(crate) fn expect_text<'a>(
    value: &'a Value,
    field: &str,
    acc: &ErrorAccumulator,
) -> Option<&'a str> {
    match value.as_text() {
        Some(text) => Some(text),
        None => {
            report_type_mismatch(field, "string", value, acc);
            None
        }
    }
}

pub(crate) fn expect_int(value: &Value, field: &str, acc: &ErrorAccumulator) -> Option<i128> {
    match value.as_integer() {
        Some(int) => Some(i128::from(int)),
        None => {
            report_type_mismatch(field, "int", value, acc);
            None
        }
    }
}

pub(crate) fn expect_bool(value: &Value, field: &str, acc: &ErrorAccumulator) -> Option<bool> {
    match value.as_bool() {
        Some(b) => Some(b),
        None => {
            report_type_mismatch(field, "bool", value, acc);
            None
        }
    }
}

pub(crate) fn expect_bytes<'a>(
    value: &'a Value,
    field: &str,
    acc: &ErrorAccumulator,
) -> Option<&'a [u8]> {
    match value.as_bytes() {
        Some(bytes) => Some(bytes.as_slice()),
        None => {
            report_type_mismatch(field, "bytestring", value, acc);
            None
        }
    }
}

pub(crate) fn expect_array<'a>(
    value: &'a Value,
    field: &str,
    acc: &ErrorAccumulator,
) -> Option<&'a [Value]> {
    match value.as_array() {
        Some(array) => Some(array.as_slice()),
        None => {
            report_type_mismatch(field, "array", value, acc);
            None
        }
    }
}

pub(crate) fn expect_map<'a>(
    value: &'a Value,
    field: &str,
    acc: &ErrorAccumulator,
) -> Option<&'a [(Value, Value)]> {
    match value.as_map() {
        Some(map) => Some(map.as_slice()),
        None => {
            report_type_mismatch(field, "map", value, acc);
            None
        }
    }
}

pub(crate) fn report_type_mismatch(
    field: &str,
    expected: &str,
    actual: &Value,
    acc: &ErrorAccumulator,
) {
    acc.report_error(
        ErrorVisibility::ClientVisible,
        invalid_type_error(field, expected, type_name(actual)),
        ErrorCode::ClientSide,
    );
}

/// Builds a CBOR map with keys in shortlex order (shorter first, ties
/// lexicographic), the canonical ordering for every map we emit.
pub(crate) fn shortlex_map(mut entries: Vec<(String, Value)>) -> Value {
    entries.sort_by(|(a, _), (b, _)| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));
    Value::Map(
        entries
            .into_iter()
            .map(|(k, v)| (Value::Text(k), v))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shortlex_orders_by_length_then_lexicographically() {
        let map = shortlex_map(vec![
            ("score".into(), Value::Bool(true)),
            ("bid".into(), Value::Bool(true)),
            ("isChaff".into(), Value::Bool(true)),
            ("adRenderURL".into(), Value::Bool(true)),
            ("components".into(), Value::Bool(true)),
        ]);
        let keys: Vec<_> = map
            .as_map()
            .unwrap()
            .iter()
            .map(|(k, _)| k.as_text().unwrap().to_string())
            .collect();
        assert_eq!(keys, ["bid", "score", "isChaff", "components", "adRenderURL"]);
    }

    #[test]
    fn type_names_match_error_vocabulary() {
        assert_eq!(type_name(&Value::Integer(1.into())), "positive int");
        assert_eq!(type_name(&Value::Integer((-1).into())), "negative int");
        assert_eq!(type_name(&Value::Text("x".into())), "string");
        assert_eq!(type_name(&Value::Bytes(vec![])), "bytestring");
        assert_eq!(type_name(&Value::Array(vec![])), "array");
        assert_eq!(type_name(&Value::Map(vec![])), "map");
    }
}
