//! Canonical JSON encoding for deterministic hashing.
//!
//! Records are encoded with these rules:
//! - Object keys sorted by code point
//! - Separators `", "` between items and `": "` after keys
//! - Every character outside printable ASCII escaped as `\uXXXX`
//!   (surrogate pairs above the BMP)
//! - Integers in plain decimal
//!
//! For integer, string, bool, and null data the output is byte-identical to
//! `json.dumps(record, sort_keys=True)`, which is how existing ledgers were
//! hashed. Floats use serde_json's shortest round-trip form.
//!
//! **CRITICAL**: changing this encoding changes every Merkle root and block hash.

use serde::Serialize;
use serde_json::{Map, Number, Value};

use crate::crypto::Sha256Hash;
use crate::error::CoreError;

/// Encode a JSON value to canonical bytes.
pub fn canonical_json(value: &Value) -> Vec<u8> {
    let mut buf = Vec::new();
    encode_value_to(&mut buf, value);
    buf
}

/// Encode a JSON object to canonical bytes.
pub fn canonical_object(map: &Map<String, Value>) -> Vec<u8> {
    let mut buf = Vec::new();
    encode_object_canonical(&mut buf, map);
    buf
}

/// Serialize any record and encode it canonically.
pub fn canonical_bytes<T: Serialize + ?Sized>(record: &T) -> Result<Vec<u8>, CoreError> {
    let value = serde_json::to_value(record)?;
    Ok(canonical_json(&value))
}

/// Structured-record hashing: canonicalize, then SHA-256.
pub fn hash_record<T: Serialize + ?Sized>(record: &T) -> Result<Sha256Hash, CoreError> {
    Ok(Sha256Hash::hash(&canonical_bytes(record)?))
}

/// Hash an already-built JSON value in structured-record mode.
pub fn hash_value(value: &Value) -> Sha256Hash {
    Sha256Hash::hash(&canonical_json(value))
}

/// Recursively encode a JSON value.
fn encode_value_to(buf: &mut Vec<u8>, value: &Value) {
    match value {
        Value::Null => buf.extend_from_slice(b"null"),
        Value::Bool(true) => buf.extend_from_slice(b"true"),
        Value::Bool(false) => buf.extend_from_slice(b"false"),
        Value::Number(n) => encode_number(buf, n),
        Value::String(s) => encode_string(buf, s),
        Value::Array(items) => encode_array(buf, items),
        Value::Object(map) => encode_object_canonical(buf, map),
    }
}

/// Integers within `i64`/`u64` print exactly. Anything wider was already
/// narrowed to `f64` when the JSON was parsed, so it prints in float form.
fn encode_number(buf: &mut Vec<u8>, n: &Number) {
    buf.extend_from_slice(n.to_string().as_bytes());
}

/// Encode a string literal, escaping everything outside `' '..='~'`.
fn encode_string(buf: &mut Vec<u8>, s: &str) {
    buf.push(b'"');
    for c in s.chars() {
        match c {
            '"' => buf.extend_from_slice(b"\\\""),
            '\\' => buf.extend_from_slice(b"\\\\"),
            '\n' => buf.extend_from_slice(b"\\n"),
            '\r' => buf.extend_from_slice(b"\\r"),
            '\t' => buf.extend_from_slice(b"\\t"),
            '\u{08}' => buf.extend_from_slice(b"\\b"),
            '\u{0c}' => buf.extend_from_slice(b"\\f"),
            ' '..='~' => buf.push(c as u8),
            _ => {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    buf.extend_from_slice(format!("\\u{:04x}", unit).as_bytes());
                }
            }
        }
    }
    buf.push(b'"');
}

fn encode_array(buf: &mut Vec<u8>, items: &[Value]) {
    buf.push(b'[');
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            buf.extend_from_slice(b", ");
        }
        encode_value_to(buf, item);
    }
    buf.push(b']');
}

/// Encode an object with keys in sorted order.
///
/// Sorted explicitly rather than relying on the map's iteration order, which
/// depends on serde_json features enabled elsewhere in the build.
fn encode_object_canonical(buf: &mut Vec<u8>, map: &Map<String, Value>) {
    let mut entries: Vec<(&String, &Value)> = map.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));

    buf.push(b'{');
    for (i, (key, value)) in entries.into_iter().enumerate() {
        if i > 0 {
            buf.extend_from_slice(b", ");
        }
        encode_string(buf, key);
        buf.extend_from_slice(b": ");
        encode_value_to(buf, value);
    }
    buf.push(b'}');
}
