//! Serializer configuration.
//!
//! Controls which schemas may be written, whether invalid instances are
//! refused, and how the JSON text is formatted.
//!
//! # Example YAML
//!
//! ```yaml
//! allowlist:
//!   - User
//!   - Group
//! exclude:
//!   - Session
//! require_valid: true
//! json:
//!   indent: 2
//!   sort_keys: false
//! ```

use std::io::{BufReader, BufWriter};
use std::path::Path;

use modelkit_core::JsonOptions;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Serializer settings, loadable from YAML.
///
/// Every key is optional; missing keys take their [`Default`] value.
///
/// # Examples
///
/// ```no_run
/// use modelkit_serialize::SerializerConfig;
///
/// let config = SerializerConfig::load("modelkit.yml").unwrap();
/// if config.is_allowed("User") {
///     println!("User models will be written");
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerializerConfig {
    /// Schema names that may be serialized (empty = every schema).
    pub allowlist: Vec<String>,
    /// Schema names that are never serialized.
    pub exclude: Vec<String>,
    /// Refuse instances that do not validate.
    pub require_valid: bool,
    /// Output formatting.
    pub json: JsonOptions,
}

impl Default for SerializerConfig {
    fn default() -> Self {
        Self {
            allowlist: Vec::new(),
            exclude: Vec::new(),
            require_valid: true,
            json: JsonOptions::default(),
        }
    }
}

impl SerializerConfig {
    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::SerializeError::IoError) if the file cannot
    /// be read, or [`YamlError`](crate::SerializeError::YamlError) if parsing
    /// fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let config = serde_yaml::from_reader(reader)?;
        Ok(config)
    }

    /// Saves the configuration as YAML.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }

    pub fn is_excluded(&self, schema: &str) -> bool {
        self.exclude.iter().any(|s| s == schema)
    }

    /// Returns `true` if models of `schema` may be serialized.
    ///
    /// Exclusions always win. An empty allowlist allows every schema that is
    /// not excluded.
    ///
    /// # Examples
    ///
    /// ```
    /// # let yaml = "allowlist: [User, Group]\nexclude: [Group]\n";
    /// # let config: modelkit_serialize::SerializerConfig = serde_yaml::from_str(yaml).unwrap();
    /// assert!(config.is_allowed("User"));
    /// assert!(!config.is_allowed("Group"));
    /// assert!(!config.is_allowed("Token"));
    /// ```
    pub fn is_allowed(&self, schema: &str) -> bool {
        if self.is_excluded(schema) {
            return false;
        }
        if self.allowlist.is_empty() {
            return true;
        }
        self.allowlist.iter().any(|s| s == schema)
    }
}
