//! Logging, dedup and other low-level utilities factored out because they
//! are needed, in the same shape, by more than one crate in the workspace.

#![deny(non_upper_case_globals)]
#![deny(non_camel_case_types)]
#![deny(non_snake_case)]
#![deny(unused_mut)]

pub mod dedup;
pub mod file;
pub mod logger;
pub mod stop;
pub mod types;

pub use dedup::DedupSet;
pub use logger::{init_logger, init_test_logger};
pub use stop::StopHandle;
pub use types::{LogLevel, LoggingConfig};

/// Re-exported so crates that need a shared mutable state lock use the same
/// implementation the workspace standardizes on.
pub use parking_lot::{Mutex, RwLock};
