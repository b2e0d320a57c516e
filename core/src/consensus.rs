//! Chain-wide constants. Difficulty is fixed for this design; dynamic
//! retargeting is left for a later revision.

/// Minimum number of leading hex `'0'` characters a valid block hash must
/// have.
pub const DIFFICULTY: usize = 4;

/// Reward paid to the miner's coinbase transaction for a mined block.
pub const BLOCK_REWARD: u64 = 10;

/// The confirmation horizon: number of blocks that must sit above a block
/// in the fork tree before it is promoted to the confirmed chain.
pub const CONFIRMATION_DEPTH: usize = 3;

/// How many of the most recent layers of nondeterminism `prune` keeps
/// around a fork tree's longest path before discarding shorter siblings.
pub const PRUNE_SLACK: usize = 2;

/// Default number of transactions the miner drains from the mempool per
/// mining round.
pub const MAX_TXNS_PER_BLOCK: usize = 5_000;

/// Default peer-to-peer listener port.
pub const DEFAULT_P2P_PORT: u16 = 11111;
