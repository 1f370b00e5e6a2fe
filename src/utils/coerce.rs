// src/utils/coerce.rs

//! Normalization of loosely-typed input values.
//!
//! Host payloads may carry the same logical field as a native JSON value, a
//! JSON-encoded string, or a delimited plain string. These helpers turn each
//! shape into one canonical Rust type so nothing downstream has to care.

use std::collections::BTreeMap;

use regex::Regex;
use serde_json::{Map, Value};

use crate::error::{AppError, Result};

/// Trimmed textual form of a scalar; `None` for null or blank values.
pub fn clean_string(value: Option<&Value>) -> Option<String> {
    let text = match value? {
        Value::Null => return None,
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    };
    if text.is_empty() { None } else { Some(text) }
}

/// First key among `keys` holding a meaningful value. Null, `false`, zero,
/// blank strings and empty lists or maps count as absent, so an alias
/// after them still applies.
pub fn first_present<'a>(payload: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| payload.get(*key))
        .find(|value| match value {
            Value::Null | Value::Bool(false) => false,
            Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
            Value::String(s) => !s.trim().is_empty(),
            Value::Array(items) => !items.is_empty(),
            Value::Object(map) => !map.is_empty(),
            Value::Bool(true) => true,
        })
}

/// Numeric form of a value; blank, null and non-numeric values give `None`.
pub fn to_float(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|v| v.is_finite())
}

/// Canonical ordered list of strings.
///
/// Accepts a JSON array, a JSON-array-encoded string, or a comma/newline
/// delimited string. A string that yields no segments becomes a one-item list.
pub fn ensure_list(value: Option<&Value>) -> Vec<String> {
    match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => array_items(items),
        Some(Value::String(s)) => string_list(s),
        Some(other) => clean_string(Some(other)).into_iter().collect(),
    }
}

fn array_items(items: &[Value]) -> Vec<String> {
    items
        .iter()
        .filter_map(|item| match item {
            Value::Null => None,
            Value::String(s) if s.is_empty() => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        })
        .collect()
}

fn string_list(raw: &str) -> Vec<String> {
    let stripped = raw.trim();
    if stripped.is_empty() {
        return Vec::new();
    }
    match serde_json::from_str::<Value>(stripped) {
        Ok(Value::Array(items)) => return array_items(&items),
        Ok(Value::String(s)) => {
            let s = s.trim();
            return if s.is_empty() { Vec::new() } else { vec![s.to_string()] };
        }
        _ => {}
    }

    let parts: Vec<String> = delimiter()
        .split(stripped)
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect();
    if parts.is_empty() {
        vec![stripped.to_string()]
    } else {
        parts
    }
}

fn delimiter() -> &'static Regex {
    static DELIMITER: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    DELIMITER.get_or_init(|| Regex::new(r"[\n,]+").expect("static delimiter regex"))
}

/// JSON object from a native object or a JSON-object-encoded string.
/// Any other shape gives an empty map.
pub fn coerce_object(value: Option<&Value>) -> Map<String, Value> {
    match value {
        Some(Value::Object(map)) => map.clone(),
        Some(Value::String(s)) => match serde_json::from_str::<Value>(s.trim()) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        },
        _ => Map::new(),
    }
}

/// String-to-string map (headers); null entries are dropped, scalars stringified.
pub fn coerce_string_map(value: Option<&Value>) -> BTreeMap<String, String> {
    coerce_object(value)
        .into_iter()
        .filter_map(|(key, val)| match val {
            Value::Null => None,
            Value::String(s) => Some((key, s)),
            other => Some((key, other.to_string())),
        })
        .collect()
}

/// Normalize the `sources` payload into a list of raw entries.
///
/// A single object counts as a one-element list; a string must decode as
/// JSON. Absent or blank input gives no entries.
pub fn coerce_sources(value: Option<&Value>) -> Result<Vec<Value>> {
    let decoded;
    let value = match value {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::String(s)) => {
            let text = s.trim();
            if text.is_empty() {
                return Ok(Vec::new());
            }
            decoded = serde_json::from_str::<Value>(text)
                .map_err(|e| AppError::config(format!("sources must be JSON; {e}")))?;
            &decoded
        }
        Some(other) => other,
    };

    match value {
        Value::Object(_) => Ok(vec![value.clone()]),
        Value::Array(items) => Ok(items.clone()),
        _ => Err(AppError::config("sources must be a JSON array of objects")),
    }
}
