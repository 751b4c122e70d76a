//! The devstack configuration file.
//!
//! `config.yml` is a flat YAML mapping. Keys are handed to the templates as
//! they are; the orchestrator itself reads `OPENEDX_RELEASE` and the
//! `ACTIVATE_*` flags. Nothing is validated at load time. A key that is
//! looked up and not found is an error, never a default.
//!
//! Values are read with YAML 1.1 booleans: `yes`/`no` and `on`/`off` load as
//! `true`/`false`, for the flags and the templates alike.

use crate::util::data::{is_truthy, load_yaml, normalize_yaml11};
use devstack_types::{DevstackError, Result};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Key holding the release tag exported as `OPENEDX_RELEASE`.
pub const RELEASE_KEY: &str = "OPENEDX_RELEASE";

/// A loaded configuration snapshot.
///
/// Two snapshots are equal when their keys and values are equal.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DevstackConfig {
    values: Map<String, Value>,
}

impl DevstackConfig {
    /// Load configuration from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            DevstackError::ConfigLoad(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let config = Self::from_yaml_str(&content).map_err(|e| match e {
            DevstackError::ConfigLoad(msg) => {
                DevstackError::ConfigLoad(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })?;

        debug!("Loaded {} configuration keys from {}", config.len(), path.display());
        Ok(config)
    }

    /// Parse configuration from YAML text.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let value = load_yaml(content)
            .map_err(|e| DevstackError::ConfigLoad(format!("Failed to parse config: {}", e)))?;
        Self::from_value(value)
    }

    /// Wrap an already-parsed value. The top level must be a mapping.
    pub fn from_value(mut value: Value) -> Result<Self> {
        normalize_yaml11(&mut value);
        match value {
            Value::Object(values) => Ok(Self { values }),
            other => Err(DevstackError::ConfigLoad(format!(
                "Top level of the configuration must be a mapping, found {}",
                type_name(&other)
            ))),
        }
    }

    /// Look up a key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Look up a key that must be present.
    pub fn require(&self, key: &str) -> Result<&Value> {
        self.values
            .get(key)
            .ok_or_else(|| DevstackError::MissingKey(key.to_string()))
    }

    /// Look up a key that must hold a scalar, rendered as a string.
    pub fn require_str(&self, key: &str) -> Result<String> {
        match self.require(key)? {
            Value::String(s) => Ok(s.clone()),
            Value::Number(n) => Ok(n.to_string()),
            Value::Bool(b) => Ok(b.to_string()),
            other => Err(DevstackError::ConfigLoad(format!(
                "'{}' must be a string, found {}",
                key,
                type_name(other)
            ))),
        }
    }

    /// Truthiness of a flag that must be present.
    pub fn flag(&self, key: &str) -> Result<bool> {
        self.require(key).map(is_truthy)
    }

    /// Release tag the stack is built for.
    pub fn release(&self) -> Result<String> {
        self.require_str(RELEASE_KEY)
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether there are no keys.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The whole mapping as a template context.
    pub fn to_value(&self) -> Value {
        Value::Object(self.values.clone())
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "a mapping",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"
OPENEDX_RELEASE: ironwood.master
ACTIVATE_ECOMMERCE: true
ACTIVATE_FORUM: false
LMS_PORT: 18000
THEMES:
  - edx-theme
"#;

    #[test]
    fn test_load_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.yml");
        fs::write(&path, SAMPLE).unwrap();

        let config = DevstackConfig::load(&path).unwrap();
        assert_eq!(config.len(), 5);
        assert_eq!(config.release().unwrap(), "ironwood.master");
        assert!(config.flag("ACTIVATE_ECOMMERCE").unwrap());
        assert!(!config.flag("ACTIVATE_FORUM").unwrap());
        assert_eq!(config.require_str("LMS_PORT").unwrap(), "18000");
        assert_eq!(config.get("THEMES"), Some(&json!(["edx-theme"])));
    }

    #[test]
    fn test_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let err = DevstackConfig::load(temp_dir.path().join("nope.yml")).unwrap_err();
        assert!(matches!(err, DevstackError::ConfigLoad(_)));
    }

    #[test]
    fn test_malformed_yaml() {
        let err = DevstackConfig::from_yaml_str("OPENEDX_RELEASE: [unterminated").unwrap_err();
        assert!(matches!(err, DevstackError::ConfigLoad(_)));
    }

    #[test]
    fn test_top_level_must_be_mapping() {
        let err = DevstackConfig::from_yaml_str("- a\n- b\n").unwrap_err();
        assert!(err.to_string().contains("a sequence"));
    }

    #[test]
    fn test_missing_key_is_error() {
        let config = DevstackConfig::from_yaml_str("ACTIVATE_NOTES: true").unwrap();
        assert!(matches!(
            config.release().unwrap_err(),
            DevstackError::MissingKey(ref k) if k == RELEASE_KEY
        ));
        assert!(config.flag("ACTIVATE_FORUM").is_err());
    }

    #[test]
    fn test_yaml11_flag_words() {
        let config = DevstackConfig::from_yaml_str(
            "ACTIVATE_ECOMMERCE: no\nACTIVATE_DISCOVERY: off\nACTIVATE_NOTES: yes\nACTIVATE_XQUEUE: On\n",
        )
        .unwrap();
        assert!(!config.flag("ACTIVATE_ECOMMERCE").unwrap());
        assert!(!config.flag("ACTIVATE_DISCOVERY").unwrap());
        assert!(config.flag("ACTIVATE_NOTES").unwrap());
        assert!(config.flag("ACTIVATE_XQUEUE").unwrap());
        assert_eq!(config.get("ACTIVATE_ECOMMERCE"), Some(&json!(false)));
    }

    #[test]
    fn test_equality_by_value() {
        let a = DevstackConfig::from_yaml_str("A: 1\nB: two").unwrap();
        let b = DevstackConfig::from_yaml_str("B: two\nA: 1").unwrap();
        let c = DevstackConfig::from_yaml_str("A: 1\nB: three").unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
