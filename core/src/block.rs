//! The block data model and its canonical hash.

use serde::{Deserialize, Serialize};

use crate::hash::{Hash, Hashed};
use crate::transaction::Transaction;

/// A confirmed or candidate block. `transactions` is always nonempty; its
/// last entry is the coinbase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Monotonic seconds, not necessarily wall-clock accurate across peers.
    pub timestamp: u64,
    /// Hex digest of the parent block. `"void"` only for genesis.
    pub last_hash: String,
    pub transactions: Vec<Transaction>,
    /// The winning nonce found by proof-of-work search.
    pub proof: String,
    /// Cached SHA-256 digest of this block's preimage.
    pub hash: Hash,
}

/// The conventional parent hash of the genesis block.
pub const VOID_HASH: &str = "void";

impl Block {
    /// Builds and hashes a new block from its constituent parts.
    pub fn new(timestamp: u64, last_hash: String, transactions: Vec<Transaction>, proof: String) -> Block {
        let preimage = Self::preimage_bytes(timestamp, &last_hash, &transactions, &proof);
        let hash = Hash::digest(&preimage);
        Block { timestamp, last_hash, transactions, proof, hash }
    }

    /// The canonical `timestamp ‖ last_hash ‖ transactions ‖ proof`
    /// preimage, serialized once as JSON with field order preserved by
    /// `serde_json`, and used identically for hashing, persistence and
    /// wire transfer so producer and verifier can never diverge.
    pub fn preimage_bytes(timestamp: u64, last_hash: &str, transactions: &[Transaction], proof: &str) -> Vec<u8> {
        #[derive(Serialize)]
        struct Preimage<'a> {
            timestamp: u64,
            last_hash: &'a str,
            transactions: &'a [Transaction],
            proof: &'a str,
        }
        let preimage = Preimage { timestamp, last_hash, transactions, proof };
        serde_json::to_vec(&preimage).expect("Block preimage always serializes")
    }

    /// Recomputes this block's hash from its fields and compares it against
    /// the cached `hash` field, catching a tampered or malformed wire block.
    pub fn hash_is_consistent(&self) -> bool {
        let expected = Hash::digest(&Self::preimage_bytes(
            self.timestamp,
            &self.last_hash,
            &self.transactions,
            &self.proof,
        ));
        expected == self.hash
    }

    /// The proof-of-work predicate: `self.hash` has at least `difficulty`
    /// leading hex `'0'` characters.
    pub fn meets_difficulty(&self, difficulty: usize) -> bool {
        self.hash.meets_difficulty(difficulty)
    }

    /// True if `transactions` is nonempty and its last entry is a coinbase.
    pub fn is_well_formed(&self) -> bool {
        matches!(self.transactions.last(), Some(tx) if tx.is_coinbase())
    }

    /// The compact header view of this block, without its transaction body,
    /// used for gossip and indexing.
    pub fn metadata(&self) -> BlockMetadata {
        BlockMetadata {
            timestamp: self.timestamp,
            last_hash: self.last_hash.clone(),
            proof: self.proof.clone(),
            hash: self.hash,
        }
    }
}

impl Hashed for Block {
    fn hash_bytes(&self) -> Vec<u8> {
        Self::preimage_bytes(self.timestamp, &self.last_hash, &self.transactions, &self.proof)
    }
}

/// The header view of a [`Block`] without its transaction body, for compact
/// gossip and indexing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockMetadata {
    pub timestamp: u64,
    pub last_hash: String,
    pub proof: String,
    pub hash: Hash,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::Address;

    fn coinbase_only_block(last_hash: &str, proof: &str) -> Block {
        let coinbase = Transaction::coinbase(Address::from("miner"), 10, 0);
        Block::new(0, last_hash.to_string(), vec![coinbase], proof.to_string())
    }

    #[test]
    fn hash_is_deterministic_over_identical_fields() {
        let a = coinbase_only_block("void", "42");
        let b = coinbase_only_block("void", "42");
        assert_eq!(a.hash, b.hash);
    }

    #[test]
    fn changing_proof_changes_hash() {
        let a = coinbase_only_block("void", "42");
        let b = coinbase_only_block("void", "43");
        assert_ne!(a.hash, b.hash);
    }

    #[test]
    fn hash_is_consistent_round_trips_through_json() {
        let b = coinbase_only_block("void", "7");
        let wire = serde_json::to_string(&b).unwrap();
        let back: Block = serde_json::from_str(&wire).unwrap();
        assert_eq!(b, back);
        assert!(back.hash_is_consistent());
    }

    #[test]
    fn block_without_trailing_coinbase_is_not_well_formed() {
        let mut b = coinbase_only_block("void", "7");
        let payment = Transaction {
            version: Transaction::VERSION.to_string(),
            sender: Address::from("alice"),
            receivers: vec![],
            outputs: vec![],
            proof: crate::transaction::Proof { public_key: String::new(), signature: String::new() },
        };
        b.transactions.push(payment);
        assert!(!b.is_well_formed());
    }
}
