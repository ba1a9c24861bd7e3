//! Canonical serialization and content hashing.
//!
//! Commit and change identity is a BLAKE3 digest over a canonical JSON
//! rendering: object keys recursively sorted, compact separators, stable
//! scalar formatting. Canonicalization is explicit rather than relying on
//! whatever key order a serializer happens to produce, so two logically
//! identical values always hash to the same id regardless of how they
//! were built.

use serde::Serialize;
use serde_json::Value;

/// Render a JSON value in canonical form.
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();

            out.push('{');
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String((*key).clone()).to_string());
                out.push(':');
                write_canonical(&map[key.as_str()], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        // Display on Value is compact JSON with stable escaping and
        // number formatting.
        scalar => out.push_str(&scalar.to_string()),
    }
}

/// Hash a serializable value: canonical JSON -> BLAKE3 -> lowercase hex.
pub fn content_hash<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let canonical = canonical_json(&serde_json::to_value(value)?);
    Ok(blake3::hash(canonical.as_bytes()).to_hex().to_string())
}
