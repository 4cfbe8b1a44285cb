//! Shape guarantees for recommendation documents read back from the store.
//!
//! The generator is only asked, never forced, to emit the documented JSON
//! shape. Everything here is pure and idempotent: normalizing an already
//! normalized document returns it unchanged.

use super::recommendation::{Priority, Recommendation};
use serde_json::{Map, Value};

fn stringify_items(items: &[Value]) -> Vec<String> {
    items
        .iter()
        .map(|item| match item {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        })
        .collect()
}

fn list_field(object: &Map<String, Value>, key: &str) -> Vec<String> {
    object
        .get(key)
        .and_then(Value::as_array)
        .map(|items| stringify_items(items))
        .unwrap_or_default()
}

fn map_field(object: &Map<String, Value>, key: &str) -> Map<String, Value> {
    object
        .get(key)
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default()
}

fn from_object(object: &Map<String, Value>) -> Recommendation {
    Recommendation {
        immediate_actions: list_field(object, "immediate_actions"),
        short_term_actions: list_field(object, "short_term_actions"),
        approval_guidance: map_field(object, "approval_guidance"),
        reserve_recommendations: map_field(object, "reserve_recommendations"),
    }
}

/// Split free text into action lines: on newlines if present, else on
/// bullets, else on hyphens.
fn split_actions(text: &str) -> Vec<String> {
    let separator = ['\n', '•', '-']
        .into_iter()
        .find(|sep| text.contains(*sep));

    match separator {
        Some(sep) => text
            .split(sep)
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(ToString::to_string)
            .collect(),
        None => vec![text.to_string()],
    }
}

fn from_text(text: &str) -> Recommendation {
    if text.trim().is_empty() {
        return Recommendation::default();
    }
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(object)) => from_object(&object),
        Ok(Value::Array(items)) => Recommendation::immediate(stringify_items(&items)),
        Ok(_) => Recommendation::immediate(vec![text.to_string()]),
        Err(_) => Recommendation::immediate(split_actions(text)),
    }
}

/// Coerce any `recommendation` value into the four-key shape.
pub fn normalize_recommendation(raw: Option<&Value>) -> Recommendation {
    match raw {
        None | Some(Value::Null) => Recommendation::default(),
        Some(Value::Object(object)) => from_object(object),
        Some(Value::String(text)) => from_text(text),
        Some(Value::Array(items)) => Recommendation::immediate(stringify_items(items)),
        Some(Value::Bool(flag)) => {
            if *flag {
                Recommendation::immediate(vec![true.to_string()])
            } else {
                Recommendation::default()
            }
        }
        Some(Value::Number(number)) => {
            let is_zero = number.as_f64().is_some_and(|n| n == 0.0);
            if is_zero {
                Recommendation::default()
            } else {
                Recommendation::immediate(vec![number.to_string()])
            }
        }
    }
}

/// Priority as a string label. Numbers go through the 1..=4 level table
/// (anything else is "Standard"), booleans count as 1 or 0; strings are
/// kept as-is.
pub fn normalize_priority(raw: Option<&Value>) -> String {
    match raw {
        None | Some(Value::Null) => Priority::Standard.to_string(),
        Some(Value::String(label)) => label.clone(),
        Some(Value::Number(number)) => integral_level(number)
            .and_then(Priority::from_level)
            .unwrap_or(Priority::Standard)
            .to_string(),
        Some(Value::Bool(flag)) => Priority::from_level(i64::from(*flag))
            .unwrap_or(Priority::Standard)
            .to_string(),
        Some(other) => other.to_string(),
    }
}

fn integral_level(number: &serde_json::Number) -> Option<i64> {
    if let Some(int) = number.as_i64() {
        return Some(int);
    }
    let float = number.as_f64()?;
    #[allow(clippy::cast_possible_truncation)]
    let truncated = float as i64;
    #[allow(clippy::cast_precision_loss)]
    let exact = (truncated as f64 - float).abs() < f64::EPSILON;
    exact.then_some(truncated)
}

/// Normalize a whole recommendation document. `recommendation` and
/// `priority` are rewritten; every other top-level key passes through.
pub fn normalize_document(raw: Value) -> Value {
    let mut document = match raw {
        Value::Object(object) => object,
        _ => Map::new(),
    };

    let recommendation = normalize_recommendation(document.get("recommendation"));
    let priority = normalize_priority(document.get("priority"));

    document.insert("recommendation".into(), recommendation.to_value());
    document.insert("priority".into(), Value::String(priority));
    Value::Object(document)
}
