// src/utils/json_path.rs

//! Dotted/bracketed path lookup over decoded JSON.
//!
//! `shipment.events[0].status` and `shipment.events.0.status` resolve to the
//! same value. Lookups never fail loudly: any miss yields `None`.

use std::io;

use serde::Serialize;
use serde_json::Value;
use serde_json::ser::{Formatter, Serializer};

/// Resolve `path` against `root`.
///
/// Tokens are separated by `.`, `[` or `]`; empty tokens are skipped.
/// Objects are indexed by key, arrays by a non-negative integer literal
/// within bounds. Anything else stops resolution.
pub fn resolve<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = root;
    for token in path.split(['.', '[', ']']).filter(|t| !t.is_empty()) {
        current = match current {
            Value::Array(items) => {
                if !token.bytes().all(|b| b.is_ascii_digit()) {
                    return None;
                }
                let index: usize = token.parse().ok()?;
                items.get(index)?
            }
            Value::Object(map) => map.get(token)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Render a resolved value as text: strings verbatim, booleans as
/// `True`/`False`, numbers as written, structures via [`to_display_json`].
pub fn value_to_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(true) => Some("True".to_string()),
        Value::Bool(false) => Some("False".to_string()),
        other => Some(to_display_json(other)),
    }
}

/// Serialize with `", "` and `": "` separators and non-ASCII characters
/// escaped as `\uXXXX`, keeping object keys in document order.
pub fn to_display_json(value: &Value) -> String {
    let mut out = Vec::new();
    let mut serializer = Serializer::with_formatter(&mut out, SpacedFormatter);
    if value.serialize(&mut serializer).is_err() {
        return value.to_string();
    }
    String::from_utf8(out).unwrap_or_else(|_| value.to_string())
}

struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first { Ok(()) } else { writer.write_all(b", ") }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first { Ok(()) } else { writer.write_all(b", ") }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }

    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        for ch in fragment.chars() {
            if ch.is_ascii() {
                writer.write_all(&[ch as u8])?;
            } else {
                let mut units = [0u16; 2];
                for unit in ch.encode_utf16(&mut units) {
                    write!(writer, "\\u{:04x}", unit)?;
                }
            }
        }
        Ok(())
    }
}
