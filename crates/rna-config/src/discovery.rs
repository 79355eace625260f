//! File-based config discovery.
//!
//! Looks for `rna.toml` in the root, then for an `rna` field in package.json.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::config::RnaConfig;
use crate::error::{ConfigError, Result};

pub const CONFIG_FILE: &str = "rna.toml";
pub const PACKAGE_FIELD: &str = "rna";

/// # Example
///
/// ```no_run
/// use rna_config::ConfigDiscovery;
///
/// let config = ConfigDiscovery::new(".").load().unwrap();
/// ```
pub struct ConfigDiscovery {
    root: PathBuf,
}

impl ConfigDiscovery {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Config file in the root directory, if any.
    pub fn find(&self) -> Option<PathBuf> {
        let toml_path = self.root.join(CONFIG_FILE);
        if toml_path.exists() {
            return Some(toml_path);
        }

        let pkg_path = self.root.join("package.json");
        let has_field = fs::read_to_string(&pkg_path)
            .ok()
            .and_then(|content| serde_json::from_str::<Value>(&content).ok())
            .is_some_and(|parsed| parsed.get(PACKAGE_FIELD).is_some_and(|v| !v.is_null()));
        has_field.then_some(pkg_path)
    }

    /// Load the discovered file alone, without defaults from other layers.
    pub fn load(&self) -> Result<RnaConfig> {
        let path = self.find().ok_or(ConfigError::NotFound)?;
        RnaConfig::from_value(read_value(&path)?)
    }
}

fn is_package_json(path: &Path) -> bool {
    path.file_name() == Some(std::ffi::OsStr::new("package.json"))
}

/// Raw JSON value of a config file: TOML, JSON, or the `rna` field of
/// package.json.
pub(crate) fn read_value(path: &Path) -> Result<Value> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.to_path_buf()));
    }
    let content = fs::read_to_string(path)?;

    if is_package_json(path) {
        let parsed: Value = serde_json::from_str(&content)
            .map_err(|e| ConfigError::invalid("package.json", format!("Invalid JSON: {e}")))?;
        return match parsed.get(PACKAGE_FIELD) {
            Some(value) if !value.is_null() => Ok(value.clone()),
            _ => Err(ConfigError::invalid(
                PACKAGE_FIELD,
                "Add an 'rna' field to your package.json",
            )),
        };
    }

    if path.extension().is_some_and(|ext| ext == "json") {
        return serde_json::from_str(&content)
            .map_err(|e| ConfigError::invalid("json", format!("Invalid JSON: {e}")));
    }

    let toml_val: toml::Value = toml::from_str(&content)
        .map_err(|e| ConfigError::invalid("toml", format!("Invalid TOML syntax: {e}")))?;
    serde_json::to_value(toml_val)
        .map_err(|e| ConfigError::invalid("toml", format!("TOML to JSON conversion failed: {e}")))
}
