//! Engine configuration.
//!
//! Defines the YAML-serializable settings that control how strictly patches
//! are applied and how merged event bindings are ordered.
//!
//! # Example YAML
//!
//! ```yaml
//! allow_new_elements: false
//! event_order: sorted
//! ```

use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Ordering of the command ids in each merged event list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventOrder {
    /// First occurrence wins, scanning parent, plugins, then main.
    #[default]
    Precedence,
    /// Lexicographic order.
    Sorted,
}

/// Settings of a [`TemplateEngine`](crate::TemplateEngine).
///
/// Missing fields take their default value, so an empty file is a valid
/// configuration.
///
/// # Examples
///
/// ```
/// use devtemplate_overriding::{EngineConfig, EventOrder};
///
/// let config: EngineConfig = serde_yaml::from_str("event_order: sorted").unwrap();
/// assert!(config.allow_new_elements);
/// assert_eq!(config.event_order, EventOrder::Sorted);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Whether a patch may add elements whose key is not in the base.
    /// When `false`, such patches fail with
    /// [`UnknownOverride`](crate::EngineError::UnknownOverride), listing the
    /// unknown keys of every element type.
    pub allow_new_elements: bool,
    /// Ordering of merged event lists.
    pub event_order: EventOrder,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            allow_new_elements: true,
            event_order: EventOrder::default(),
        }
    }
}

impl EngineConfig {
    /// Configuration that only lets patches touch existing elements.
    pub fn strict() -> Self {
        Self {
            allow_new_elements: false,
            ..Self::default()
        }
    }

    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::EngineError::IoError) if the file cannot
    /// be read, or [`YamlError`](crate::EngineError::YamlError) if parsing
    /// fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let config = serde_yaml::from_reader(reader)?;
        Ok(config)
    }

    /// Saves the configuration as YAML.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::EngineError::IoError) if the file cannot
    /// be written, or [`YamlError`](crate::EngineError::YamlError) if
    /// serialization fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_complete() {
        let yaml = r#"
allow_new_elements: false
event_order: sorted
"#;
        let config: EngineConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(!config.allow_new_elements);
        assert_eq!(config.event_order, EventOrder::Sorted);
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let config: EngineConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert!(config.allow_new_elements);
        assert_eq!(config.event_order, EventOrder::Precedence);
    }

    #[test]
    fn test_rejects_unknown_event_order() {
        let result: std::result::Result<EngineConfig, _> =
            serde_yaml::from_str("event_order: random");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_save_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.yml");

        let original = EngineConfig::strict();
        original.save(&path).unwrap();

        let loaded = EngineConfig::load(&path).unwrap();
        assert_eq!(loaded, original);
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = EngineConfig::load(dir.path().join("absent.yml")).unwrap_err();
        assert!(matches!(err, crate::EngineError::IoError(_)));
    }
}
