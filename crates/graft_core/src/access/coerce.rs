// coerce.rs - Generic value coercion
//
// Applied when a stored value is read as a different kind, or a supplied
// value is written to a member declared with a different kind. Only scalar
// conversions are attempted; lists, references and objects never coerce.

use crate::access::{Value, ValueKind};

/// Convert `value` so that `target` accepts it.
///
/// On failure the untouched value is handed back.
pub fn coerce(value: Value, target: &ValueKind) -> Result<Value, Value> {
    if target.accepts(&value) {
        return Ok(value);
    }

    match (value, target) {
        (Value::Int(v), ValueKind::Float) => Ok(Value::Float(v as f64)),
        (Value::Int(v), ValueKind::Bool) => Ok(Value::Bool(v != 0)),
        (Value::Int(v), ValueKind::Str) => Ok(Value::Str(v.to_string())),

        (Value::Float(v), ValueKind::Int) => float_to_int(v).map(Value::Int).ok_or(Value::Float(v)),
        (Value::Float(v), ValueKind::Bool) => Ok(Value::Bool(v != 0.0)),
        (Value::Float(v), ValueKind::Str) => Ok(Value::Str(v.to_string())),

        (Value::Bool(v), ValueKind::Int) => Ok(Value::Int(i64::from(v))),
        (Value::Bool(v), ValueKind::Float) => Ok(Value::Float(if v { 1.0 } else { 0.0 })),
        (Value::Bool(v), ValueKind::Str) => Ok(Value::Str(v.to_string())),

        (Value::Str(s), ValueKind::Int) => match s.trim().parse::<i64>() {
            Ok(v) => Ok(Value::Int(v)),
            Err(_) => Err(Value::Str(s)),
        },
        (Value::Str(s), ValueKind::Float) => match s.trim().parse::<f64>() {
            Ok(v) => Ok(Value::Float(v)),
            Err(_) => Err(Value::Str(s)),
        },
        (Value::Str(s), ValueKind::Bool) => match parse_bool(&s) {
            Some(v) => Ok(Value::Bool(v)),
            None => Err(Value::Str(s)),
        },

        (value, _) => Err(value),
    }
}

/// Round half to even, then range-check against `i64`.
fn float_to_int(v: f64) -> Option<i64> {
    if !v.is_finite() {
        return None;
    }
    let rounded = v.round_ties_even();
    // i64::MAX as f64 rounds up to 2^63, which is already out of range.
    if rounded < i64::MIN as f64 || rounded >= i64::MAX as f64 {
        return None;
    }
    Some(rounded as i64)
}

fn parse_bool(s: &str) -> Option<bool> {
    let s = s.trim();
    if s.eq_ignore_ascii_case("true") {
        Some(true)
    } else if s.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}
