//! Public types for the node's configuration file.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use ember_core::consensus::DEFAULT_P2P_PORT;
use ember_util::LoggingConfig;

/// Error type wrapping config errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("error parsing configuration file at {0} - {1}")]
    ParseError(String, String),

    #[error("{1} {0}")]
    FileIOError(String, String),

    #[error("configuration file not found: {0}")]
    FileNotFoundError(String),

    #[error("error serializing configuration: {0}")]
    SerializationError(String),
}

impl From<std::io::Error> for ConfigError {
    fn from(error: std::io::Error) -> ConfigError {
        ConfigError::FileIOError(String::new(), format!("error loading config file: {}", error))
    }
}

/// Peer-to-peer overlay settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct P2pConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub seeds: Vec<String>,
}

impl Default for P2pConfig {
    fn default() -> P2pConfig {
        P2pConfig { host: "0.0.0.0".to_string(), port: DEFAULT_P2P_PORT, seeds: Vec::new() }
    }
}

/// Server-wide settings: where chain data lives and how the overlay binds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    pub db_root: String,
    #[serde(default)]
    pub p2p_config: P2pConfig,
}

impl Default for ServerConfig {
    fn default() -> ServerConfig {
        ServerConfig { db_root: ".ember".to_string(), p2p_config: P2pConfig::default() }
    }
}

/// Mining settings. Absent or `enable_mining = false` means the node runs
/// chain and overlay only, with no miner task.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MiningConfig {
    pub enable_mining: bool,
    pub miner_address: Option<String>,
}

impl Default for MiningConfig {
    fn default() -> MiningConfig {
        MiningConfig { enable_mining: false, miner_address: None }
    }
}

/// Holds all of the various configuration sections separately, then put
/// together as a single [`GlobalConfig`] afterwards. This flattens out the
/// configuration file into logical sections, as they tend to be quite
/// nested. Most sections are optional, as they may or may not be needed
/// depending on what's being run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConfigMembers {
    pub server: ServerConfig,
    #[serde(default)]
    pub mining: Option<MiningConfig>,
    #[serde(default)]
    pub logging: Option<LoggingConfig>,
}

impl Default for ConfigMembers {
    fn default() -> ConfigMembers {
        ConfigMembers {
            server: ServerConfig::default(),
            mining: Some(MiningConfig::default()),
            logging: Some(LoggingConfig::default()),
        }
    }
}

/// Top-level config container. Keeps track of whether a config file was
/// actually read, so the caller can tell "defaults" from "file matched
/// defaults" apart if it cares to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GlobalConfig {
    pub config_file_path: Option<PathBuf>,
    pub using_config_file: bool,
    pub members: Option<ConfigMembers>,
}

impl Default for GlobalConfig {
    fn default() -> GlobalConfig {
        GlobalConfig {
            config_file_path: None,
            using_config_file: false,
            members: Some(ConfigMembers::default()),
        }
    }
}
