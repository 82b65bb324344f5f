//! Key-value settings stores.

use crate::errors::SettingsError;
use dashmap::DashMap;
use std::collections::HashMap;
use std::path::Path;

/// Read access to persisted settings.
pub trait SettingsStore: Send + Sync {
    /// Returns the value stored under `key`.
    fn get(&self, key: &str) -> Option<String>;

    /// Returns the value under `key` or `default`.
    fn get_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }
}

/// Settings held in memory.
#[derive(Debug, Default)]
pub struct InMemorySettings {
    values: DashMap<String, String>,
}

impl InMemorySettings {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a value, builder style.
    #[must_use]
    pub fn with(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Stores a value.
    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    /// Removes a value.
    pub fn remove(&self, key: &str) {
        self.values.remove(key);
    }
}

impl SettingsStore for InMemorySettings {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).map(|v| v.value().clone())
    }
}

/// Settings loaded from a flat JSON object file.
///
/// String values are taken verbatim; numbers and booleans are stored in
/// their JSON text form. Nested values are rejected.
#[derive(Debug, Clone, Default)]
pub struct JsonFileSettings {
    values: HashMap<String, String>,
}

impl JsonFileSettings {
    /// Loads settings from `path`. A missing file yields empty settings.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(SettingsError::Read {
                    path: path.display().to_string(),
                    source,
                })
            }
        };
        Self::from_json(&text).map_err(|reason| SettingsError::Invalid {
            path: path.display().to_string(),
            reason,
        })
    }

    fn from_json(text: &str) -> Result<Self, String> {
        let object: serde_json::Map<String, serde_json::Value> =
            serde_json::from_str(text).map_err(|e| e.to_string())?;

        let mut values = HashMap::with_capacity(object.len());
        for (key, value) in object {
            let value = match value {
                serde_json::Value::String(s) => s,
                serde_json::Value::Number(n) => n.to_string(),
                serde_json::Value::Bool(b) => b.to_string(),
                serde_json::Value::Null => continue,
                _ => return Err(format!("value of '{key}' is not a scalar")),
            };
            values.insert(key, value);
        }
        Ok(Self { values })
    }
}

impl SettingsStore for JsonFileSettings {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_in_memory_settings() {
        let settings = InMemorySettings::new().with("compiler", "ECJ");
        assert_eq!(settings.get("compiler"), Some("ECJ".to_string()));

        settings.set("compiler", "Javac");
        assert_eq!(settings.get_or("compiler", "x"), "Javac");

        settings.remove("compiler");
        assert_eq!(settings.get_or("compiler", "x"), "x");
    }

    #[test]
    fn test_json_file_settings() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"compiler": "ECJ", "java_release": 8, "debug": true, "unset": null}}"#)
            .unwrap();

        let settings = JsonFileSettings::load(file.path()).unwrap();
        assert_eq!(settings.get("compiler"), Some("ECJ".to_string()));
        assert_eq!(settings.get("java_release"), Some("8".to_string()));
        assert_eq!(settings.get("debug"), Some("true".to_string()));
        assert_eq!(settings.get("unset"), None);
    }

    #[test]
    fn test_json_file_settings_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let settings = JsonFileSettings::load(dir.path().join("absent.json")).unwrap();
        assert_eq!(settings.get("compiler"), None);
    }

    #[test]
    fn test_json_file_settings_rejects_nested() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"compiler": {{"name": "ECJ"}}}}"#).unwrap();

        let err = JsonFileSettings::load(file.path()).unwrap_err();
        assert!(matches!(err, SettingsError::Invalid { .. }));
    }
}
