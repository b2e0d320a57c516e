//! Block and transaction data model shared by every embercoin crate:
//! hashing, canonical serialization, the genesis constant and the
//! chain-wide consensus constants.

#![deny(non_upper_case_globals)]
#![deny(non_camel_case_types)]
#![deny(non_snake_case)]
#![deny(unused_mut)]

pub mod address;
pub mod block;
pub mod consensus;
pub mod genesis;
pub mod hash;
pub mod transaction;

pub use address::{Address, SignatureProducer};
pub use block::{Block, BlockMetadata};
pub use hash::{Hash, Hashed};
pub use transaction::{OutputRef, Proof, Receiver, Transaction};
