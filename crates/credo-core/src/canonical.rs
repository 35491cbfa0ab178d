//! Canonical JSON serialization for signing payloads.
//!
//! Object keys are emitted in byte order at every nesting level and no
//! insignificant whitespace is written, so two values that compare equal
//! always produce identical bytes regardless of how their maps were built.

use serde_json::Value;

use crate::error::CoreError;

/// Serialize a JSON value canonically.
pub fn to_canonical_vec(value: &Value) -> Result<Vec<u8>, CoreError> {
    let mut out = Vec::with_capacity(128);
    write_value(value, &mut out)?;
    Ok(out)
}

/// Serialize a JSON value canonically into a `String`.
pub fn to_canonical_string(value: &Value) -> Result<String, CoreError> {
    let bytes = to_canonical_vec(value)?;
    // Only valid UTF-8 is ever written.
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn write_value(value: &Value, out: &mut Vec<u8>) -> Result<(), CoreError> {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));

            out.push(b'{');
            for (i, (key, val)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                serde_json::to_writer(&mut *out, key)?;
                out.push(b':');
                write_value(val, out)?;
            }
            out.push(b'}');
        }
        Value::Array(items) => {
            out.push(b'[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                write_value(item, out)?;
            }
            out.push(b']');
        }
        scalar => serde_json::to_writer(&mut *out, scalar)?,
    }
    Ok(())
}
