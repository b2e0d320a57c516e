//! The hash primitive used pervasively to identify blocks and to chain
//! them together. A [`Hash`] is a 32-byte SHA-256 digest, displayed and
//! (de)serialized as lowercase hex so that it reads the same on the wire,
//! on disk and in logs.

use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

/// Number of leading hex zero characters a block hash must carry to satisfy
/// the proof-of-work predicate. Fixed for this design; dynamic retargeting
/// is a non-goal (see `consensus::DIFFICULTY`).
pub const HASH_LEN: usize = 32;

/// A SHA-256 digest, used to uniquely identify blocks and to thread the
/// hash chain's `last_hash` links.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Hash(pub [u8; HASH_LEN]);

/// The conventional `last_hash` of the genesis block: it has no parent.
pub const VOID_HASH_STR: &str = "void";

impl Hash {
    /// Hashes the given bytes with SHA-256.
    pub fn digest(bytes: &[u8]) -> Hash {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        let out = hasher.finalize();
        let mut a = [0u8; HASH_LEN];
        a.copy_from_slice(&out);
        Hash(a)
    }

    /// Returns the lowercase hex encoding of this hash.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// True if this hash has at least `difficulty` leading hex `'0'`
    /// characters, i.e. satisfies the proof-of-work predicate.
    pub fn meets_difficulty(&self, difficulty: usize) -> bool {
        let hex = self.to_hex();
        hex.as_bytes().iter().take(difficulty).all(|&b| b == b'0')
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({})", self.to_hex())
    }
}

/// Error returned when a hex string does not decode to a 32-byte hash.
#[derive(Debug, thiserror::Error)]
#[error("invalid hash hex string: {0}")]
pub struct HashParseError(String);

impl FromStr for Hash {
    type Err = HashParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s).map_err(|_| HashParseError(s.to_string()))?;
        if bytes.len() != HASH_LEN {
            return Err(HashParseError(s.to_string()));
        }
        let mut a = [0u8; HASH_LEN];
        a.copy_from_slice(&bytes);
        Ok(Hash(a))
    }
}

impl Serialize for Hash {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Hash {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Hash::from_str(&s).map_err(de::Error::custom)
    }
}

/// A type whose canonical byte representation can be hashed.
///
/// Every hashed structure (`Block`, `Transaction`) implements this over its
/// canonical JSON serialization, so the same bytes are used for hashing,
/// persistence and wire transfer.
pub trait Hashed {
    /// Returns the canonical bytes this type hashes over.
    fn hash_bytes(&self) -> Vec<u8>;

    /// Hashes the canonical bytes with SHA-256.
    fn hash(&self) -> Hash {
        Hash::digest(&self.hash_bytes())
    }
}
