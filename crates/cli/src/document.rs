//! JSON document parsing for deeply nested traces.
//!
//! Call trees nest two JSON levels per call, so serde_json's default
//! recursion limit of 128 would cap traces at roughly 63 calls. Parsing here
//! disables that limit, grows the stack on demand through `serde_stacker`, and
//! enforces an explicit depth cap on the raw bytes before anything is built.

use anyhow::bail;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Deepest call nesting accepted in a request.
pub const MAX_CALL_DEPTH: usize = 1024;

/// Deepest JSON nesting accepted: two levels per call plus the envelope.
pub const MAX_DOCUMENT_DEPTH: usize = 2 * MAX_CALL_DEPTH + 16;

/// Maximum bracket nesting of a JSON text, ignoring brackets inside strings.
pub fn nesting_depth(bytes: &[u8]) -> usize {
    let mut depth = 0usize;
    let mut deepest = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for &byte in bytes {
        if in_string {
            if escaped {
                escaped = false;
            } else if byte == b'\\' {
                escaped = true;
            } else if byte == b'"' {
                in_string = false;
            }
            continue;
        }
        match byte {
            b'"' => in_string = true,
            b'[' | b'{' => {
                depth += 1;
                deepest = deepest.max(depth);
            }
            b']' | b'}' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }

    deepest
}

pub fn check_depth(bytes: &[u8]) -> anyhow::Result<()> {
    let depth = nesting_depth(bytes);
    if depth > MAX_DOCUMENT_DEPTH {
        bail!(
            "JSON nesting depth {} exceeds the maximum of {} (call depth is limited to {})",
            depth,
            MAX_DOCUMENT_DEPTH,
            MAX_CALL_DEPTH
        );
    }
    Ok(())
}

/// Deserialize without serde_json's recursion limit.
///
/// Callers bound the input with [`check_depth`] first.
pub fn from_slice<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, serde_json::Error> {
    let mut de = serde_json::Deserializer::from_slice(bytes);
    de.disable_recursion_limit();
    let value = T::deserialize(serde_stacker::Deserializer::new(&mut de))?;
    de.end()?;
    Ok(value)
}

/// Depth-checks and parses a document into a [`Value`].
pub fn parse_document(bytes: &[u8]) -> anyhow::Result<Value> {
    check_depth(bytes)?;
    Ok(from_slice(bytes)?)
}

/// Drops a [`Value`] without recursing once per nesting level.
pub fn dismantle(value: Value) {
    let mut pending = vec![value];
    while let Some(value) = pending.pop() {
        match value {
            Value::Array(items) => pending.extend(items),
            Value::Object(map) => pending.extend(map.into_iter().map(|(_, v)| v)),
            _ => {}
        }
    }
}
