//! Small supporting types for the chain engine.

use std::path::PathBuf;

/// Tunables for a [`crate::chain::Chain`] instance.
#[derive(Debug, Clone)]
pub struct ChainConfig {
    /// Directory the metadata and transactions tables are persisted under.
    pub data_dir: PathBuf,
    /// Number of leading hex zero characters a block hash must carry.
    pub difficulty: usize,
    /// Depth a block must be buried under the fork tree root before it is
    /// promoted into the confirmed chain.
    pub confirmation_depth: usize,
    /// Slack kept below the longest root-to-leaf path when pruning
    /// short-lived sibling forks.
    pub prune_slack: usize,
    /// Whether a successful attachment retries orphans whose `last_hash`
    /// now matches the newly attached block (resolves the open question in
    /// the design notes around orphan re-homing; defaults to `true`).
    pub rehome_orphans: bool,
}

impl Default for ChainConfig {
    fn default() -> ChainConfig {
        ChainConfig {
            data_dir: PathBuf::from(".ember/chain"),
            difficulty: ember_core::consensus::DIFFICULTY,
            confirmation_depth: ember_core::consensus::CONFIRMATION_DEPTH,
            prune_slack: ember_core::consensus::PRUNE_SLACK,
            rehome_orphans: true,
        }
    }
}

/// What happened to a block handed to [`crate::chain::Chain::add_block`].
/// Insertion failures are reported through this status, never as an `Err`
/// (only I/O during persistence is fallible).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    /// Replayed a trusted block directly onto the confirmed chain (the
    /// `is_confirmed = true` load path).
    Confirmed,
    /// Attached into the fork tree (possibly also triggering one or more
    /// promotions, reflected in the chain's height afterward).
    Attached,
    /// No known attachment site; parked in the orphan set.
    Orphaned,
    /// Already present in the confirmed chain, the fork tree, or the
    /// orphan set; the call was a no-op.
    Duplicate,
    /// `is_confirmed = true` but `last_hash` did not match the current tip.
    Rejected,
}
