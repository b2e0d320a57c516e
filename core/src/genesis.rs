//! The genesis block: a fixed, bit-exact constant every node must agree on.

use crate::address::Address;
use crate::block::{Block, VOID_HASH};
use crate::transaction::{Proof, Receiver, Transaction};

/// Builds the genesis block: `timestamp = 0`, `last_hash = "void"`,
/// `proof = "0"`, a single coinbase transaction.
pub fn genesis_block() -> Block {
    let coinbase = Transaction {
        version: Transaction::VERSION.to_string(),
        sender: Address::mine(),
        receivers: vec![Receiver::new(Address::from("mima"), 10)],
        outputs: Vec::new(),
        proof: Proof { public_key: String::new(), signature: String::new() },
    };
    Block::new(0, VOID_HASH.to_string(), vec![coinbase], "0".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn genesis_is_deterministic() {
        assert_eq!(genesis_block(), genesis_block());
    }

    #[test]
    fn genesis_has_the_documented_shape() {
        let g = genesis_block();
        assert_eq!(g.timestamp, 0);
        assert_eq!(g.last_hash, "void");
        assert_eq!(g.proof, "0");
        assert_eq!(g.transactions.len(), 1);
        assert!(g.transactions[0].is_coinbase());
    }
}
