//! ISBN normalization helpers used by the reference matcher.

use serde_json::Value;

use crate::types::IsbnKey;

/// Length of a legacy ISBN that lost its leading zero.
const LEGACY_ISBN_DIGITS: usize = 9;

/// Render a raw ISBN occurrence as a lookup key.
///
/// Sequences contribute their first element, numbers their integer form, and
/// hyphens are stripped. With `pad_legacy` a 9-digit result gains a leading
/// `0`. Returns `None` for values that cannot carry an ISBN.
pub fn normalize_isbn(raw: &Value, pad_legacy: bool) -> Option<IsbnKey> {
    let rendered = match raw {
        Value::Array(items) => return normalize_isbn(items.first()?, pad_legacy),
        Value::String(text) => text.clone(),
        Value::Number(number) => integer_form(number)?,
        _ => return None,
    };
    let stripped: String = rendered.chars().filter(|ch| *ch != '-').collect();
    if stripped.is_empty() {
        return None;
    }
    if pad_legacy && stripped.len() == LEGACY_ISBN_DIGITS {
        return Some(format!("0{stripped}"));
    }
    Some(stripped)
}

fn integer_form(number: &serde_json::Number) -> Option<String> {
    if let Some(value) = number.as_u64() {
        return Some(value.to_string());
    }
    if let Some(value) = number.as_i64() {
        return Some(value.to_string());
    }
    let value = number.as_f64()?;
    if value.fract() == 0.0 && value.is_finite() && value >= 0.0 {
        Some(format!("{value:.0}"))
    } else {
        None
    }
}

/// Scalar string form used for predicate equality.
///
/// Strings render as-is, numbers and booleans via `Display`. Containers and
/// `null` have no scalar form.
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

/// True when `field` equals `wanted`, or is a sequence containing it.
pub fn value_matches(field: &Value, wanted: &Value) -> bool {
    if field == wanted {
        return true;
    }
    match field {
        Value::Array(items) => items.iter().any(|item| item == wanted),
        _ => false,
    }
}

/// True for values that count as absent: `null`, empty strings, and empty containers.
pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => text.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

/// Short description of a value's kind for error messages.
pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "a mapping",
    }
}
