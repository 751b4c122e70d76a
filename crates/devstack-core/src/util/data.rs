//! YAML data handling utilities.

use devstack_types::Result;
use serde_json::Value;

/// Load YAML from string.
pub fn load_yaml(content: &str) -> Result<Value> {
    Ok(serde_yaml::from_str(content)?)
}

/// YAML 1.1 boolean spellings.
///
/// serde_yaml follows YAML 1.2, where `yes`, `no`, `on` and `off` are plain
/// strings. Configuration files written for the 1.1 loaders still use them.
pub fn yaml11_bool(s: &str) -> Option<bool> {
    match s {
        "yes" | "Yes" | "YES" | "on" | "On" | "ON" => Some(true),
        "no" | "No" | "NO" | "off" | "Off" | "OFF" => Some(false),
        _ => None,
    }
}

/// Replace YAML 1.1 boolean words with booleans, recursively.
pub fn normalize_yaml11(value: &mut Value) {
    match value {
        Value::String(s) => {
            if let Some(b) = yaml11_bool(s) {
                *value = Value::Bool(b);
            }
        }
        Value::Array(items) => items.iter_mut().for_each(normalize_yaml11),
        Value::Object(map) => map.values_mut().for_each(normalize_yaml11),
        _ => {}
    }
}

/// YAML truthiness as the activation flags use it.
///
/// `null`, `false`, zero, and empty strings, sequences, or mappings are false.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}
