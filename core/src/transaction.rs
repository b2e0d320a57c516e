//! The transaction data model. Transactions are
//! carried through the chain structurally: the core never validates
//! balances or signatures (UTXO/signature validation is a non-goal), it
//! only threads them through blocks and hashes them.

use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::hash::{Hash, Hashed};

/// A reference to a prior transaction output, identifying it by the block
/// that contains it, the transaction within that block, and the output's
/// index within that transaction's receiver list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputRef {
    pub block_id: Hash,
    pub txn_id: Hash,
    pub output_id: u32,
}

/// The proof of authorship attached to a transaction: a public key and the
/// signature it produced over the transaction's signing preimage. Neither
/// field is verified by the core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proof {
    pub public_key: String,
    pub signature: String,
}

/// A single payment: a receiver address and a non-negative amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receiver {
    pub address: Address,
    pub amount: u64,
}

impl Receiver {
    pub fn new(address: impl Into<Address>, amount: u64) -> Self {
        Receiver { address: address.into(), amount }
    }
}

/// A structurally-typed transaction record. The special sender
/// [`Address::MINE`] marks a coinbase; the special receiver address
/// [`Address::FEES`] marks miner-fee assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub version: String,
    pub sender: Address,
    pub receivers: Vec<Receiver>,
    pub outputs: Vec<OutputRef>,
    pub proof: Proof,
}

impl Transaction {
    /// Current transaction format version, stamped on every new transaction.
    pub const VERSION: &'static str = "1.0";

    /// Builds a coinbase transaction paying `reward` to `miner` and, when
    /// `fees` is nonzero, assigning it to the [`Address::FEES`] receiver.
    pub fn coinbase(miner: Address, reward: u64, fees: u64) -> Transaction {
        let mut receivers = vec![Receiver::new(miner, reward)];
        if fees > 0 {
            receivers.push(Receiver::new(Address::from(Address::FEES), fees));
        }
        Transaction {
            version: Self::VERSION.to_string(),
            sender: Address::mine(),
            receivers,
            outputs: Vec::new(),
            proof: Proof { public_key: String::new(), signature: String::new() },
        }
    }

    /// True if this transaction is a coinbase (paid by the reserved `"mine"`
    /// sender address).
    pub fn is_coinbase(&self) -> bool {
        self.sender.is_mine()
    }

    /// The canonical bytes used both to produce and to verify a
    /// transaction's signature: everything but the `proof` itself.
    pub fn signing_preimage(&self) -> Vec<u8> {
        #[derive(Serialize)]
        struct Unsigned<'a> {
            version: &'a str,
            sender: &'a Address,
            receivers: &'a [Receiver],
            outputs: &'a [OutputRef],
        }
        let unsigned = Unsigned {
            version: &self.version,
            sender: &self.sender,
            receivers: &self.receivers,
            outputs: &self.outputs,
        };
        serde_json::to_vec(&unsigned).expect("Transaction always serializes")
    }
}

impl Hashed for Transaction {
    /// The full canonical encoding, proof included, used to identify this
    /// transaction for gossip dedup (unlike [`Transaction::signing_preimage`],
    /// which deliberately excludes the proof).
    fn hash_bytes(&self) -> Vec<u8> {
        serde_json::to_vec(self).expect("Transaction always serializes")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coinbase_has_no_fee_receiver_when_fees_are_zero() {
        let tx = Transaction::coinbase(Address::from("alice"), 10, 0);
        assert_eq!(tx.receivers.len(), 1);
        assert!(tx.is_coinbase());
    }

    #[test]
    fn coinbase_adds_fee_receiver_when_fees_present() {
        let tx = Transaction::coinbase(Address::from("alice"), 10, 3);
        assert_eq!(tx.receivers.len(), 2);
        assert_eq!(tx.receivers[1].address, Address::from(Address::FEES));
        assert_eq!(tx.receivers[1].amount, 3);
    }

    #[test]
    fn equal_transactions_compare_equal_by_value() {
        let a = Transaction::coinbase(Address::from("alice"), 10, 0);
        let b = Transaction::coinbase(Address::from("alice"), 10, 0);
        assert_eq!(a, b);
    }

    #[test]
    fn hash_distinguishes_transactions_with_different_proofs() {
        let mut a = Transaction::coinbase(Address::from("alice"), 10, 0);
        let mut b = a.clone();
        a.proof.signature = "sig-a".to_string();
        b.proof.signature = "sig-b".to_string();
        assert_ne!(a.hash(), b.hash());
    }
}
