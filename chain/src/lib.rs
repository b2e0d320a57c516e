//! The chain engine: confirmed chain, unconfirmed fork tree, orphan set,
//! and their CSV-backed persistence.

#![deny(non_upper_case_globals)]
#![deny(non_camel_case_types)]
#![deny(non_snake_case)]
#![deny(unused_mut)]

pub mod chain;
pub mod error;
pub mod fork_tree;
pub mod orphan;
pub mod persist;
pub mod types;

pub use chain::{Chain, LastBlock};
pub use error::Error;
pub use fork_tree::{ForkTree, NodeId};
pub use orphan::OrphanSet;
pub use types::{ChainConfig, InsertOutcome};
