// SPDX-License-Identifier: MIT OR Apache-2.0

//! YAML file configuration source.
//!
//! Nested mappings and sequences are flattened into dot-separated keys, so
//!
//! ```yaml
//! server:
//!   hosts: [a, b]
//! ```
//!
//! yields `server.hosts.0 = a` and `server.hosts.1 = b`. The file is re-read on every reload.

use crate::domain::{ConfigKey, ConfigValue, OptionsError, Result};
use crate::ports::ConfigSource;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

const SOURCE_NAME: &str = "yaml-file";

/// Maximum accepted file size.
const MAX_YAML_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// A configuration source backed by a YAML file.
///
/// # Examples
///
/// ```
/// use hexopts::adapters::YamlFileSource;
/// use hexopts::ports::ConfigSource;
///
/// let source = YamlFileSource::from_str("server:\n  port: 8080\n").unwrap();
/// assert_eq!(source.get_str("server.port").unwrap().unwrap().as_str(), "8080");
/// ```
#[derive(Debug, Clone)]
pub struct YamlFileSource {
    path: Option<PathBuf>,
    values: BTreeMap<ConfigKey, ConfigValue>,
}

impl YamlFileSource {
    /// Loads `path`. The file must exist and parse.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let values = read_file(&path)?;
        tracing::debug!(
            "Loaded {} key(s) from YAML file {}",
            values.len(),
            path.display()
        );
        Ok(Self {
            path: Some(path),
            values,
        })
    }

    /// Parses YAML held in memory. Reloading such a source is a no-op.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self> {
        Ok(Self {
            path: None,
            values: parse(content)?,
        })
    }

    /// The backing file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

impl ConfigSource for YamlFileSource {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    fn priority(&self) -> u8 {
        1
    }

    fn get(&self, key: &ConfigKey) -> Result<Option<ConfigValue>> {
        Ok(self.values.get(key).cloned())
    }

    fn all_keys(&self) -> Result<Vec<ConfigKey>> {
        Ok(self.values.keys().cloned().collect())
    }

    fn reload(&mut self) -> Result<()> {
        if let Some(path) = &self.path {
            self.values = read_file(path)?;
            tracing::debug!(
                "Reloaded {} key(s) from YAML file {}",
                self.values.len(),
                path.display()
            );
        }
        Ok(())
    }
}

fn source_error(message: String, source: Option<crate::domain::BoxError>) -> OptionsError {
    OptionsError::SourceError {
        source_name: SOURCE_NAME.to_string(),
        message,
        source,
    }
}

fn read_file(path: &Path) -> Result<BTreeMap<ConfigKey, ConfigValue>> {
    let metadata = fs::metadata(path).map_err(|e| {
        source_error(
            format!("Failed to read metadata of {}", path.display()),
            Some(Box::new(e)),
        )
    })?;
    if metadata.len() > MAX_YAML_FILE_SIZE {
        return Err(source_error(
            format!(
                "Configuration file too large: {} bytes (max {} bytes)",
                metadata.len(),
                MAX_YAML_FILE_SIZE
            ),
            None,
        ));
    }
    let content = fs::read_to_string(path).map_err(|e| {
        source_error(
            format!("Failed to read {}", path.display()),
            Some(Box::new(e)),
        )
    })?;
    parse(&content)
}

fn parse(content: &str) -> Result<BTreeMap<ConfigKey, ConfigValue>> {
    let value: serde_yaml::Value = serde_yaml::from_str(content)
        .map_err(|e| source_error(format!("Failed to parse YAML: {}", e), Some(Box::new(e))))?;
    let mut values = BTreeMap::new();
    flatten(&value, ConfigKey::root(), &mut values);
    Ok(values)
}

fn flatten(value: &serde_yaml::Value, key: ConfigKey, out: &mut BTreeMap<ConfigKey, ConfigValue>) {
    use serde_yaml::Value;

    match value {
        Value::Mapping(map) => {
            for (k, v) in map {
                let segment = match k {
                    Value::String(s) => s.clone(),
                    Value::Number(n) => n.to_string(),
                    Value::Bool(b) => b.to_string(),
                    _ => continue,
                };
                flatten(v, key.child(&segment), out);
            }
        }
        Value::Sequence(items) => {
            for (i, v) in items.iter().enumerate() {
                flatten(v, key.child(&i.to_string()), out);
            }
        }
        Value::String(s) => {
            out.insert(key, ConfigValue::from(s.as_str()));
        }
        Value::Number(n) => {
            out.insert(key, ConfigValue::from(n.to_string()));
        }
        Value::Bool(b) => {
            out.insert(key, ConfigValue::from(b.to_string()));
        }
        Value::Null => {
            out.insert(key, ConfigValue::from(""));
        }
        Value::Tagged(tagged) => flatten(&tagged.value, key, out),
    }
}
