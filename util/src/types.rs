//! Logging configuration types, shared by every crate that logs through
//! [`crate::logger`].

use serde::{Deserialize, Serialize};

/// Log level types.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    Warning,
    Info,
    Debug,
    Trace,
}

/// Logging configuration: where to log, and at what level.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    pub log_to_stdout: bool,
    pub stdout_log_level: LogLevel,
    pub log_to_file: bool,
    pub file_log_level: LogLevel,
    pub log_file_path: String,
    pub log_file_append: bool,
    pub log_max_size: Option<u64>,
}

impl Default for LoggingConfig {
    fn default() -> LoggingConfig {
        LoggingConfig {
            log_to_stdout: true,
            stdout_log_level: LogLevel::Info,
            log_to_file: true,
            file_log_level: LogLevel::Debug,
            log_file_path: String::from("embercoin.log"),
            log_file_append: true,
            log_max_size: Some(1024 * 1024 * 16),
        }
    }
}
