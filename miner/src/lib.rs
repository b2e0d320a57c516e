//! Parallel proof-of-work block assembly for embercoin: drains the
//! mempool, assembles a coinbase-terminated candidate block, and races
//! worker threads to find a valid nonce.

#![deny(non_upper_case_globals)]
#![deny(non_camel_case_types)]
#![deny(non_snake_case)]
#![deny(unused_mut)]

pub mod miner;
pub mod search;

pub use miner::{Miner, MinerConfig};
