//! The pending-transaction pool, keeping a FIFO view of transactions the
//! miner may include in its next block.

#![deny(non_upper_case_globals)]
#![deny(non_camel_case_types)]
#![deny(non_snake_case)]
#![deny(unused_mut)]

pub mod mempool;

pub use mempool::Mempool;
