//! Wallet addresses are opaque to the core: a wallet (out of scope for this
//! crate) derives keys and produces addresses and signatures; the core only
//! ever stores and compares the resulting string.

use std::fmt;

use serde::{Deserialize, Serialize};

/// An opaque wallet endpoint identifier. Two special values are recognized
/// by the data model: [`Address::MINE`] marks a coinbase sender, and
/// [`Address::FEES`] marks the miner-fee receiver of a transaction.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Address(pub String);

impl Address {
    /// The sender address of every coinbase transaction.
    pub const MINE: &'static str = "mine";
    /// The receiver address that denotes a miner-fee assignment.
    pub const FEES: &'static str = "FEES";

    /// Returns a new address wrapping the given string.
    pub fn new(s: impl Into<String>) -> Self {
        Address(s.into())
    }

    /// The well-known coinbase sender address.
    pub fn mine() -> Self {
        Address(Self::MINE.to_string())
    }

    /// True if this address is the coinbase sender marker.
    pub fn is_mine(&self) -> bool {
        self.0 == Self::MINE
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for Address {
    fn from(s: String) -> Self {
        Address(s)
    }
}

impl From<&str> for Address {
    fn from(s: &str) -> Self {
        Address(s.to_string())
    }
}

/// Produces a transaction signature from a wallet's private key. The core
/// never verifies signatures (UTXO/signature validation is a non-goal); this
/// trait exists so tests can supply a fake signer without pulling in a real
/// wallet implementation.
pub trait SignatureProducer {
    /// Signs `preimage` and returns the signature as an opaque string.
    fn sign(&self, preimage: &[u8]) -> String;

    /// The public key to attach alongside the signature.
    fn public_key(&self) -> String;
}
