//! Layered configuration: defaults, then the config file, then `RNA_*`
//! environment variables.

use std::path::Path;

use figment::Figment;
use figment::providers::{Env, Serialized};

use crate::config::RnaConfig;
use crate::discovery::{ConfigDiscovery, read_value};
use crate::error::{ConfigError, Result};

/// Environment prefix; nested keys use `__`, e.g. `RNA_DEV__PORT=9000`.
pub const ENV_PREFIX: &str = "RNA_";

impl RnaConfig {
    /// Load configuration for `root`.
    ///
    /// `config_path` must exist when given; otherwise the file is discovered
    /// and a missing file just means defaults.
    pub fn load(root: &Path, config_path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::new().merge(Serialized::defaults(RnaConfig::default()));

        let file = match config_path {
            Some(path) => Some(path.to_path_buf()),
            None => ConfigDiscovery::new(root).find(),
        };
        if let Some(path) = file {
            tracing::debug!(path = %path.display(), "loading config file");
            figment = figment.merge(Serialized::defaults(read_value(&path)?));
        }

        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

        let config: RnaConfig = figment
            .extract()
            .map_err(|e| ConfigError::invalid("configuration", e))?;
        config.validate()?;
        Ok(config)
    }
}
