//! Configuration file management: loading a [`GlobalConfig`] from a TOML
//! file on disk, or falling back to defaults when none is given.

use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use crate::types::{ConfigError, GlobalConfig};

/// Name of the config file the node looks for when none is given explicitly.
pub const CONFIG_FILE_NAME: &str = "ember.toml";

impl GlobalConfig {
    /// Loads configuration from `config_file`, or returns [`GlobalConfig::default`]
    /// if `config_file` is `None`.
    pub fn new(config_file: Option<&str>) -> Result<GlobalConfig, ConfigError> {
        let mut result = GlobalConfig::default();

        if let Some(file_path) = config_file {
            let path = PathBuf::from(file_path);
            if !path.exists() {
                return Err(ConfigError::FileNotFoundError(file_path.to_string()));
            }
            result.using_config_file = true;
            result.config_file_path = Some(path.clone());
            result.read_file(&path)?;
        }

        Ok(result)
    }

    fn read_file(&mut self, path: &Path) -> Result<(), ConfigError> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;
        let members = toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError(path.display().to_string(), e.to_string()))?;
        self.members = Some(members);
        Ok(())
    }

    /// Serializes this config back out to `path`, e.g. to materialize a
    /// fully-commented default config for a new node.
    pub fn write_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let members = self
            .members
            .as_ref()
            .ok_or_else(|| ConfigError::SerializationError("no config members set".to_string()))?;
        let toml_str = toml::to_string(members)
            .map_err(|e| ConfigError::SerializationError(e.to_string()))?;
        let mut file = File::create(path)?;
        file.write_all(toml_str.as_bytes())?;
        Ok(())
    }

    /// Rewrites `db_root` to be rooted at `base_dir`, used when materializing
    /// a fresh default config in a directory the caller chose.
    pub fn update_paths(&mut self, base_dir: &Path) {
        if let Some(ref mut members) = self.members {
            let mut db_root = base_dir.to_path_buf();
            db_root.push(&members.server.db_root);
            members.server.db_root = db_root.to_string_lossy().into_owned();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_file_not_found() {
        let result = GlobalConfig::new(Some("/nonexistent/ember.toml"));
        assert!(matches!(result, Err(ConfigError::FileNotFoundError(_))));
    }

    #[test]
    fn no_file_falls_back_to_defaults() {
        let config = GlobalConfig::new(None).unwrap();
        assert!(!config.using_config_file);
        assert_eq!(config.members, Some(crate::types::ConfigMembers::default()));
    }
}
