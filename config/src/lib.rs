//! Configuration file loading for the embercoin node.

#![deny(non_upper_case_globals)]
#![deny(non_camel_case_types)]
#![deny(non_snake_case)]
#![deny(unused_mut)]

pub mod config;
pub mod types;

pub use config::CONFIG_FILE_NAME;
pub use types::{ConfigError, ConfigMembers, GlobalConfig, MiningConfig, P2pConfig, ServerConfig};
