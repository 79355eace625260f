//! Configuration structure for the rna dev server.

use std::net::IpAddr;
use std::path::PathBuf;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ConfigError, Result};

/// JSX export kinds accepted in `transform.jsx_export`.
pub const JSX_EXPORTS: &[&str] = &["named", "default", "namespace"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RnaConfig {
    #[serde(default)]
    pub dev: DevSettings,

    #[serde(default)]
    pub transform: TransformSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DevSettings {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Served directory; the working directory when unset.
    #[serde(default)]
    pub root_dir: Option<PathBuf>,
}

impl Default for DevSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            root_dir: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformSettings {
    #[serde(default)]
    pub jsx_factory: Option<String>,

    #[serde(default)]
    pub jsx_fragment: Option<String>,

    #[serde(default)]
    pub jsx_module: Option<String>,

    #[serde(default = "default_jsx_export")]
    pub jsx_export: String,

    /// Exact-match specifier substitutions, applied in order.
    #[serde(default)]
    pub alias: IndexMap<String, String>,
}

impl Default for TransformSettings {
    fn default() -> Self {
        Self {
            jsx_factory: None,
            jsx_fragment: None,
            jsx_module: None,
            jsx_export: default_jsx_export(),
            alias: IndexMap::new(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".into()
}

fn default_port() -> u16 {
    8000
}

fn default_jsx_export() -> String {
    "named".into()
}

impl RnaConfig {
    /// Create from a JSON value, e.g. the `rna` field of package.json.
    pub fn from_value(value: Value) -> Result<Self> {
        let config: RnaConfig =
            serde_json::from_value(value).map_err(|e| ConfigError::invalid("config", e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_value(&self) -> Result<Value> {
        serde_json::to_value(self).map_err(|e| ConfigError::invalid("config", e))
    }

    /// Reject values serde accepts but the server cannot use.
    pub fn validate(&self) -> Result<()> {
        if self.dev.host.parse::<IpAddr>().is_err() && self.dev.host != "localhost" {
            return Err(ConfigError::invalid(
                "dev.host",
                format!("'{}' is not an IP address", self.dev.host),
            ));
        }

        let export = self.transform.jsx_export.as_str();
        if !JSX_EXPORTS.contains(&export) {
            return Err(ConfigError::invalid(
                "transform.jsx_export",
                format!("expected one of {}, got '{export}'", JSX_EXPORTS.join(", ")),
            ));
        }

        let empty = self
            .transform
            .alias
            .iter()
            .find(|(from, to)| from.is_empty() || to.is_empty());
        if let Some((from, _)) = empty {
            return Err(ConfigError::invalid(
                "transform.alias",
                format!("alias '{from}' must map a non-empty specifier to a non-empty target"),
            ));
        }
        Ok(())
    }
}
