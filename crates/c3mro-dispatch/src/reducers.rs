//! Stock reducers for [`CombinatorConfig`](crate::CombinatorConfig).

use serde_json::Value;

/// Array concatenation: array results are appended element by element, any
/// other result as a single element. A non-array accumulator is wrapped first.
pub fn concat(acc: Value, result: Value) -> Value {
    let mut items = match acc {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        other => vec![other],
    };
    match result {
        Value::Array(more) => items.extend(more),
        other => items.push(other),
    }
    Value::Array(items)
}

/// Collects each result as one element.
pub fn push(mut acc: Vec<Value>, result: Value) -> Vec<Value> {
    acc.push(result);
    acc
}

/// Numeric sum. Lossy: a non-numeric result counts as zero and leaves no
/// trace. Use [`checked_sum`] to see the offending result instead.
pub fn sum(acc: f64, result: Value) -> f64 {
    acc + result.as_f64().unwrap_or(0.0)
}

/// Numeric sum seeded with `Ok(0.0)`. The first non-numeric result becomes
/// the `Err` and later results are ignored.
pub fn checked_sum(acc: Result<f64, Value>, result: Value) -> Result<f64, Value> {
    let total = acc?;
    match result.as_f64() {
        Some(n) => Ok(total + n),
        None => Err(result),
    }
}

/// Keeps the last result.
pub fn last(_acc: Value, result: Value) -> Value {
    result
}
