//! Facade over the confirmed chain, the unconfirmed fork tree and the
//! orphan set: the single place block insertion, pruning, promotion and
//! lookup happen.

use std::str::FromStr;

use log::{debug, info};

use ember_core::genesis::genesis_block;
use ember_core::{Block, Hash, Hashed};

use crate::error::Error;
use crate::fork_tree::ForkTree;
use crate::orphan::OrphanSet;
use crate::persist;
use crate::types::{ChainConfig, InsertOutcome};

/// What [`Chain::last_block`] returns: a single confirmed tip, or every
/// leaf currently competing for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LastBlock {
    Confirmed(Block),
    Unconfirmed(Vec<Block>),
}

pub struct Chain {
    config: ChainConfig,
    confirmed: Vec<Block>,
    tree: ForkTree,
    orphans: OrphanSet,
}

impl Chain {
    /// A fresh chain seeded with nothing but the genesis block.
    pub fn new(config: ChainConfig) -> Chain {
        Chain { config, confirmed: vec![genesis_block()], tree: ForkTree::new(), orphans: OrphanSet::new() }
    }

    /// Loads a chain from `config.data_dir`, replaying persisted blocks onto
    /// a fresh genesis-seeded chain. Returns a genesis-only chain if no
    /// persisted state exists yet.
    pub fn load(config: ChainConfig) -> Result<Chain, Error> {
        let mut chain = Chain::new(config);
        let blocks = persist::load(&chain.config.data_dir)?;
        for block in blocks {
            chain.add_block(block, true);
        }
        Ok(chain)
    }

    /// Rewrites the persisted metadata and transactions tables from the
    /// in-memory confirmed chain (skipping the implicit genesis row).
    pub fn save(&self) -> Result<(), Error> {
        persist::save(&self.config.data_dir, &self.confirmed[1..])
    }

    pub fn confirmed_tip(&self) -> &Block {
        self.confirmed.last().expect("genesis is always present")
    }

    /// The confirmed chain in order, genesis first.
    pub fn confirmed_blocks(&self) -> &[Block] {
        &self.confirmed
    }

    pub fn height(&self, include_unconfirmed: bool) -> usize {
        let confirmed = self.confirmed.len();
        if !include_unconfirmed {
            return confirmed;
        }
        match self.tree.max_depth() {
            Some(depth) => confirmed + depth + 1,
            None => confirmed,
        }
    }

    pub fn last_block(&self, confirmed: bool) -> LastBlock {
        if confirmed {
            return LastBlock::Confirmed(self.confirmed_tip().clone());
        }
        if self.tree.is_empty() {
            return LastBlock::Unconfirmed(Vec::new());
        }
        let leaves = self.tree.leaves().into_iter().map(|id| self.tree.block(id).clone()).collect();
        LastBlock::Unconfirmed(leaves)
    }

    /// The block a miner should extend: the confirmed tip if the fork tree
    /// is empty, otherwise the deepest leaf (ties broken by arrival order,
    /// i.e. the first such leaf `ForkTree::leaves` yields).
    pub fn mining_parent(&self) -> &Block {
        if self.tree.is_empty() {
            return self.confirmed_tip();
        }
        let leaves = self.tree.leaves();
        let mut deepest = leaves[0];
        let mut deepest_depth = self.tree.depth_of(deepest);
        for &id in &leaves[1..] {
            let depth = self.tree.depth_of(id);
            if depth > deepest_depth {
                deepest = id;
                deepest_depth = depth;
            }
        }
        self.tree.block(deepest)
    }

    pub fn get_block(&self, hash: &Hash) -> Option<&Block> {
        if let Some(block) = self.confirmed.iter().find(|b| b.hash == *hash) {
            return Some(block);
        }
        self.tree.find_by_hash(hash).map(|id| self.tree.block(id))
    }

    fn contains(&self, hash: &Hash) -> bool {
        self.confirmed.iter().any(|b| b.hash == *hash)
            || self.tree.find_by_hash(hash).is_some()
            || self.orphans.contains(hash)
    }

    /// Attempts to insert `block`. See [`InsertOutcome`] for the possible
    /// dispositions; insertion failures are reported through the return
    /// value, never as a panic or `Err`.
    pub fn add_block(&mut self, block: Block, is_confirmed: bool) -> InsertOutcome {
        if is_confirmed {
            return self.add_confirmed(block);
        }

        if self.contains(&block.hash) {
            debug!("add_block: duplicate {}", block.hash);
            return InsertOutcome::Duplicate;
        }

        let attached = self.attach(block);
        if attached {
            self.prune();
            self.promote();
        }
        if attached {
            InsertOutcome::Attached
        } else {
            InsertOutcome::Orphaned
        }
    }

    fn add_confirmed(&mut self, block: Block) -> InsertOutcome {
        if self.contains(&block.hash) {
            return InsertOutcome::Duplicate;
        }
        if block.last_hash != self.confirmed_tip().hash.to_hex() {
            debug!("add_block: confirmed replay rejected, last_hash mismatch for {}", block.hash);
            return InsertOutcome::Rejected;
        }
        info!("chain: confirmed block {} at height {}", block.hash, self.confirmed.len());
        self.confirmed.push(block);
        InsertOutcome::Confirmed
    }

    /// Attaches `block` into the fork tree (or the orphan set, if no
    /// attachment site exists), then recursively rehomes any orphans that
    /// were waiting on it, when the chain is configured to do so. Returns
    /// `true` if `block` itself found a home in the tree.
    fn attach(&mut self, block: Block) -> bool {
        let hash = block.hash;
        let attached = if self.tree.is_empty() {
            if block.last_hash == self.confirmed_tip().hash.to_hex() {
                self.tree.set_root(block);
                true
            } else {
                self.orphans.insert(block);
                false
            }
        } else {
            match Hash::from_str(&block.last_hash).ok().and_then(|h| self.tree.find_by_hash(&h)) {
                Some(parent) => {
                    self.tree.attach(parent, block);
                    true
                }
                None => {
                    self.orphans.insert(block);
                    false
                }
            }
        };

        if attached {
            debug!("chain: attached {} to fork tree", hash);
            self.rehome(hash);
        } else {
            debug!("chain: orphaned {}, now tracking {} orphans", hash, self.orphans.len());
        }
        attached
    }

    fn rehome(&mut self, parent: Hash) {
        if !self.config.rehome_orphans {
            return;
        }
        for child in self.orphans.take_children_of(&parent) {
            self.attach(child);
        }
    }

    /// Discards sibling forks of the root that have fallen too far behind
    /// the longest known path.
    fn prune(&mut self) {
        let Some(longest) = self.tree.max_depth() else { return };
        let slack = self.config.prune_slack;
        if longest < slack {
            return;
        }
        let threshold = longest - slack;
        for child in self.tree.root_children() {
            let reach = self.tree.leaves_under(child).into_iter().map(|l| self.tree.depth_of(l)).max().unwrap();
            if reach < threshold {
                debug!("chain: pruning fork reaching depth {} (threshold {})", reach, threshold);
                self.tree.detach(child);
            }
        }
    }

    /// While the tree root has a single child and is buried deep enough,
    /// promotes it into the confirmed chain.
    fn promote(&mut self) {
        loop {
            let children = self.tree.root_children();
            let Some(depth) = self.tree.max_depth() else { break };
            if children.len() != 1 || depth < self.config.confirmation_depth {
                break;
            }
            let promoted = self.tree.pop_root();
            info!("chain: promoted {} to confirmed height {}", promoted.hash, self.confirmed.len());
            self.confirmed.push(promoted);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_core::{Address, Transaction};

    fn mined_block(parent: &Block, nonce: &str) -> Block {
        let coinbase = Transaction::coinbase(Address::from("miner"), 10, 0);
        Block::new(parent.timestamp + 1, parent.hash.to_hex(), vec![coinbase], nonce.to_string())
    }

    fn test_config() -> ChainConfig {
        ChainConfig { confirmation_depth: 3, prune_slack: 2, ..ChainConfig::default() }
    }

    #[test]
    fn empty_mempool_style_block_extends_tip_and_stays_unconfirmed_below_depth() {
        let mut chain = Chain::new(test_config());
        let genesis = chain.confirmed_tip().clone();
        let b1 = mined_block(&genesis, "a");
        assert_eq!(chain.add_block(b1, false), InsertOutcome::Attached);
        assert_eq!(chain.height(false), 1);
        assert_eq!(chain.height(true), 2);
    }

    #[test]
    fn depth_exactly_confirmation_depth_with_unique_child_promotes_once() {
        let mut chain = Chain::new(test_config());
        let mut tip = chain.confirmed_tip().clone();
        for i in 0..4 {
            let next = mined_block(&tip, &i.to_string());
            chain.add_block(next.clone(), false);
            tip = next;
        }
        // four unconfirmed blocks on a single chain: depth 3 triggers one promotion.
        assert_eq!(chain.height(false), 2);
        assert_eq!(chain.height(true), 5);
    }

    #[test]
    fn two_root_children_at_depth_prevents_promotion() {
        let mut chain = Chain::new(test_config());
        let genesis = chain.confirmed_tip().clone();
        let b1 = mined_block(&genesis, "a");
        let b2 = mined_block(&genesis, "b");
        chain.add_block(b1.clone(), false);
        chain.add_block(b2.clone(), false);
        assert_eq!(chain.height(false), 1);
        match chain.last_block(false) {
            LastBlock::Unconfirmed(leaves) => assert_eq!(leaves.len(), 2),
            _ => panic!("expected unconfirmed leaves"),
        }
    }

    #[test]
    fn mining_parent_is_confirmed_tip_when_tree_empty() {
        let chain = Chain::new(test_config());
        assert_eq!(chain.mining_parent().hash, chain.confirmed_tip().hash);
    }

    #[test]
    fn mining_parent_is_the_deepest_leaf() {
        let mut chain = Chain::new(test_config());
        let genesis = chain.confirmed_tip().clone();
        let b1 = mined_block(&genesis, "short");
        chain.add_block(b1.clone(), false);
        let b2 = mined_block(&genesis, "longer-a");
        chain.add_block(b2.clone(), false);
        let b3 = mined_block(&b2, "longer-b");
        chain.add_block(b3.clone(), false);
        assert_eq!(chain.mining_parent().hash, b3.hash);
    }

    #[test]
    fn orphan_with_unknown_parent_never_joins_confirmed_chain() {
        let mut chain = Chain::new(test_config());
        let genesis = chain.confirmed_tip().clone();
        let dangling_parent = mined_block(&genesis, "never-seen");
        let orphan = mined_block(&dangling_parent, "x");
        assert_eq!(chain.add_block(orphan, false), InsertOutcome::Orphaned);
        assert_eq!(chain.height(false), 1);
    }

    #[test]
    fn duplicate_insertion_is_a_no_op() {
        let mut chain = Chain::new(test_config());
        let genesis = chain.confirmed_tip().clone();
        let b1 = mined_block(&genesis, "a");
        assert_eq!(chain.add_block(b1.clone(), false), InsertOutcome::Attached);
        assert_eq!(chain.add_block(b1, false), InsertOutcome::Duplicate);
    }

    #[test]
    fn orphan_rehomes_once_its_parent_is_attached() {
        let mut chain = Chain::new(test_config());
        let genesis = chain.confirmed_tip().clone();
        let b1 = mined_block(&genesis, "a");
        let b2 = mined_block(&b1, "b");

        assert_eq!(chain.add_block(b2.clone(), false), InsertOutcome::Orphaned);
        assert_eq!(chain.add_block(b1, false), InsertOutcome::Attached);
        assert!(chain.get_block(&b2.hash).is_some());
    }
}
