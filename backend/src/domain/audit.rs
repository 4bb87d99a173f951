use serde_json::{Map, Value};

const REDACTED: &str = "***REDACTED***";

pub fn redact_json(value: &Value) -> Value {
    match value {
        Value::Object(object) => {
            let mut mapped = Map::with_capacity(object.len());
            for (key, value) in object {
                if is_sensitive_key(key) {
                    mapped.insert(key.clone(), Value::String(REDACTED.to_string()));
                } else {
                    mapped.insert(key.clone(), redact_json(value));
                }
            }
            Value::Object(mapped)
        }
        Value::Array(array) => Value::Array(array.iter().map(redact_json).collect()),
        _ => value.clone(),
    }
}

/// Compact, redacted rendering of a raw config payload for audit lines.
pub fn redact_raw_json(raw: &[u8]) -> String {
    match serde_json::from_slice::<Value>(raw) {
        Ok(value) => serde_json::to_string(&redact_json(&value))
            .unwrap_or_else(|_| REDACTED.to_string()),
        Err(_) => "<non-json payload redacted>".to_string(),
    }
}

fn is_sensitive_key(key: &str) -> bool {
    let lowered = key.to_ascii_lowercase();
    ["pass", "secret", "token", "authorization"]
        .iter()
        .any(|needle| lowered.contains(needle))
}
