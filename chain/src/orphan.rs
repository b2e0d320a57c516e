//! Blocks whose parent is unknown at arrival time: a primary index by hash
//! plus a reverse index from a missing parent hash to the orphan waiting
//! on it, so a newly-attached block can pull its children back out in
//! O(1) instead of scanning the whole set.

use std::collections::HashMap;

use ember_core::{Block, Hash, Hashed};

#[derive(Default)]
pub struct OrphanSet {
    orphans: HashMap<Hash, Block>,
    by_parent: HashMap<String, Vec<Hash>>,
}

impl OrphanSet {
    pub fn new() -> Self {
        OrphanSet::default()
    }

    pub fn len(&self) -> usize {
        self.orphans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orphans.is_empty()
    }

    pub fn contains(&self, hash: &Hash) -> bool {
        self.orphans.contains_key(hash)
    }

    /// Indexes by the raw `last_hash` string rather than a parsed [`Hash`],
    /// so a peer-supplied block with a malformed `last_hash` is still held
    /// as an orphan instead of being rejected outright — it simply never
    /// matches a parent and stays until pruned.
    pub fn insert(&mut self, block: Block) {
        let hash = block.hash();
        self.by_parent.entry(block.last_hash.clone()).or_default().push(hash);
        self.orphans.insert(hash, block);
    }

    /// Removes and returns every orphan whose `last_hash` equals `parent`,
    /// so the caller can retry inserting them now that the parent exists.
    pub fn take_children_of(&mut self, parent: &Hash) -> Vec<Block> {
        let Some(hashes) = self.by_parent.remove(&parent.to_hex()) else { return Vec::new() };
        hashes.into_iter().filter_map(|h| self.orphans.remove(&h)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_core::genesis::genesis_block;

    fn child_of(parent_hash: Hash, nonce: &str) -> Block {
        Block::new(1, parent_hash.to_hex(), Vec::new(), nonce.to_string())
    }

    #[test]
    fn take_children_of_returns_only_matching_orphans() {
        let mut set = OrphanSet::new();
        let g = genesis_block();
        let unrelated = Block::new(1, "deadbeef".repeat(8), Vec::new(), "z".to_string());
        let child = child_of(g.hash(), "a");
        let child_hash = child.hash();

        set.insert(unrelated);
        set.insert(child);
        assert_eq!(set.len(), 2);

        let ready = set.take_children_of(&g.hash());
        assert_eq!(ready.len(), 1);
        assert_eq!(ready[0].hash(), child_hash);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn take_children_of_unknown_parent_is_empty() {
        let mut set = OrphanSet::new();
        let g = genesis_block();
        assert!(set.take_children_of(&g.hash()).is_empty());
    }
}
