//! Node orchestration: brings up the chain engine, mempool, miner and
//! overlay behind a single [`Node`] handle, runs the startup sync, and
//! wires the `get_*`/`post_*` command verbs into the overlay's command
//! table.

#![deny(non_upper_case_globals)]
#![deny(non_camel_case_types)]
#![deny(non_snake_case)]
#![deny(unused_mut)]

pub mod error;
pub mod hooks;
pub mod node;

pub use error::Error;
pub use hooks::{ChainEvents, EventLogger, NetEvents};
pub use node::Node;
