//! Order-insensitive structural comparison of JSON documents.

use serde_json::{Map, Number, Value};

/// True when `left` and `right` hold the same data, ignoring sequence order.
///
/// Mapping keys and scalar values must match exactly; sequences are compared
/// as multisets, so `[1, 2, 2]` equals `[2, 1, 2]` but not `[1, 2]`.
pub fn structurally_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Number(a), Value::Number(b)) => numbers_equal(a, b),
        (Value::Object(a), Value::Object(b)) => maps_equal(a, b),
        (Value::Array(a), Value::Array(b)) => sequences_equal(a, b),
        _ => false,
    }
}

/// Inverse of [`structurally_equal`], named for the reconciler's emit decision.
pub fn has_changed(before: &Value, after: &Value) -> bool {
    !structurally_equal(before, after)
}

fn numbers_equal(a: &Number, b: &Number) -> bool {
    if a == b {
        return true;
    }
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        return x == y;
    }
    if let (Some(x), Some(y)) = (a.as_u64(), b.as_u64()) {
        return x == y;
    }
    // integers past 64 bits are compared by their exact digits
    if is_integral(a) && is_integral(b) {
        return false;
    }
    // 1 and 1.0 compare equal
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => false,
    }
}

fn is_integral(number: &Number) -> bool {
    !number.to_string().contains(['.', 'e', 'E'])
}

fn maps_equal(a: &Map<String, Value>, b: &Map<String, Value>) -> bool {
    a.len() == b.len()
        && a.iter().all(|(key, value)| {
            b.get(key)
                .is_some_and(|other| structurally_equal(value, other))
        })
}

fn sequences_equal(a: &[Value], b: &[Value]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut claimed = vec![false; b.len()];
    a.iter().all(|item| {
        let slot = b
            .iter()
            .enumerate()
            .position(|(idx, candidate)| !claimed[idx] && structurally_equal(item, candidate));
        match slot {
            Some(idx) => {
                claimed[idx] = true;
                true
            }
            None => false,
        }
    })
}
