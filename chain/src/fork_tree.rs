//! The unconfirmed portion of the chain: a rooted, finitely-branching tree
//! of candidate blocks sitting on top of the confirmed tip.
//!
//! Nodes live in an arena (`Vec<Option<Node>>`) and reference each other by
//! integer handle rather than by pointer, so a parent/child pair never forms
//! an ownership cycle: the arena owns every node, a `parent` link is just an
//! index, and detaching a subtree means tombstoning its entries and unlinking
//! them from their parent's child list.

use ember_core::{Block, Hash, Hashed};

/// An opaque handle into a [`ForkTree`]'s arena. Stable across insertions;
/// invalidated only for the specific node it names once that node is
/// detached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

struct Node {
    block: Block,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Tree of not-yet-confirmed blocks extending the confirmed tip.
#[derive(Default)]
pub struct ForkTree {
    arena: Vec<Option<Node>>,
    root: Option<NodeId>,
}

impl ForkTree {
    pub fn new() -> Self {
        ForkTree { arena: Vec::new(), root: None }
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    pub fn root(&self) -> Option<&Block> {
        self.root.map(|id| &self.node(id).block)
    }

    pub fn root_id(&self) -> Option<NodeId> {
        self.root
    }

    fn node(&self, id: NodeId) -> &Node {
        self.arena[id.0].as_ref().expect("dangling NodeId used after detach")
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        self.arena[id.0].as_mut().expect("dangling NodeId used after detach")
    }

    pub fn block(&self, id: NodeId) -> &Block {
        &self.node(id).block
    }

    /// Sets `block` as the tree's root. Only valid while the tree is empty.
    pub fn set_root(&mut self, block: Block) -> NodeId {
        assert!(self.is_empty(), "set_root called on a non-empty ForkTree");
        let id = self.push(Node { block, parent: None, children: Vec::new() });
        self.root = Some(id);
        id
    }

    fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.arena.len());
        self.arena.push(Some(node));
        id
    }

    /// Attaches `block` as a new child of `parent`.
    pub fn attach(&mut self, parent: NodeId, block: Block) -> NodeId {
        let id = self.push(Node { block, parent: Some(parent), children: Vec::new() });
        self.node_mut(parent).children.push(id);
        id
    }

    /// Depth-first search for the first node whose block hash equals `hash`.
    pub fn find_by_hash(&self, hash: &Hash) -> Option<NodeId> {
        let root = self.root?;
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let node = self.node(id);
            if node.block.hash() == *hash {
                return Some(id);
            }
            stack.extend(node.children.iter().copied());
        }
        None
    }

    /// Every leaf (childless) node currently in the tree.
    pub fn leaves(&self) -> Vec<NodeId> {
        let Some(root) = self.root else { return Vec::new() };
        self.leaves_under(root)
    }

    /// Every leaf (childless) node reachable from `id`, `id` itself included
    /// if it has no children.
    pub fn leaves_under(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(cur) = stack.pop() {
            let node = self.node(cur);
            if node.children.is_empty() {
                out.push(cur);
            } else {
                stack.extend(node.children.iter().copied());
            }
        }
        out
    }

    /// Number of edges from the root to `id`.
    pub fn depth_of(&self, id: NodeId) -> usize {
        let mut depth = 0;
        let mut cur = id;
        while let Some(parent) = self.node(cur).parent {
            depth += 1;
            cur = parent;
        }
        depth
    }

    /// Longest root-to-leaf path, in edges. Zero for a single-node tree,
    /// `None` if the tree is empty.
    pub fn max_depth(&self) -> Option<usize> {
        self.root?;
        self.leaves().into_iter().map(|leaf| self.depth_of(leaf)).max()
    }

    /// Detaches `id` and its entire subtree from the tree, tombstoning every
    /// node involved. No-op if `id` is the root (use [`ForkTree::pop_root`]
    /// for that).
    pub fn detach(&mut self, id: NodeId) {
        if Some(id) == self.root {
            return;
        }
        if let Some(parent) = self.node(id).parent {
            self.node_mut(parent).children.retain(|&c| c != id);
        }
        self.tombstone_subtree(id);
    }

    fn tombstone_subtree(&mut self, id: NodeId) {
        let children = std::mem::take(&mut self.node_mut(id).children);
        for child in children {
            self.tombstone_subtree(child);
        }
        self.arena[id.0] = None;
    }

    /// Drops the root's block from the tree and replaces the root with its
    /// sole child, detaching the child from its old parent link. Panics if
    /// the root doesn't have exactly one child; callers check that first.
    pub fn pop_root(&mut self) -> Block {
        let root = self.root.expect("pop_root called on an empty ForkTree");
        let mut children = std::mem::take(&mut self.node_mut(root).children);
        assert_eq!(children.len(), 1, "pop_root requires a single child");
        let new_root = children.remove(0);
        self.node_mut(new_root).parent = None;
        let old = self.arena[root.0].take().expect("root present");
        self.root = Some(new_root);
        old.block
    }

    /// Direct children of the root, in arrival order.
    pub fn root_children(&self) -> Vec<NodeId> {
        match self.root {
            Some(root) => self.node(root).children.clone(),
            None => Vec::new(),
        }
    }
}
