//! Identity index — identity key to first-claiming node.
//!
//! Scoped to one ingestion pass or one diff computation and dropped
//! afterwards. Holds handles only; it never owns or frees the nodes it
//! points at.

use std::collections::HashMap;

use crate::graph::arena::NodePool;
use crate::graph::forest::Forest;
use crate::types::node::{Identity, NodeId};


#[derive(Debug, Default)]
pub struct IdentityIndex {
    claims: HashMap<Identity, NodeId>,
}


impl IdentityIndex {
    pub fn new() -> Self {
        IdentityIndex::default()
    }

    /// Index every node of the subtree at `root`. The first node seen for an
    /// identity keeps the claim.
    pub fn build<P: NodePool>(forest: &Forest<P>, root: Option<NodeId>) -> Self {
        let mut index = IdentityIndex::new();
        index.add_all(forest, root);
        index
    }

    /// Register `node` as the claimant of `identity` unless one exists.
    /// Returns true when this call made the claim.
    pub fn claim(&mut self, identity: Identity, node: NodeId) -> bool {
        match self.claims.entry(identity) {
            std::collections::hash_map::Entry::Occupied(_) => false,
            std::collections::hash_map::Entry::Vacant(slot) => {
                slot.insert(node);
                true
            }
        }
    }

    pub fn add_all<P: NodePool>(&mut self, forest: &Forest<P>, root: Option<NodeId>) {
        for (id, _) in forest.descendants(root) {
            self.claim(forest.node(id).identity, id);
        }
    }

    pub fn lookup(&self, identity: Identity) -> Option<NodeId> {
        self.claims.get(&identity).copied()
    }

    /// Ingestion dedup check. On a hit the claiming node gains one reference
    /// and the caller must not descend into the object again.
    pub fn is_marked<P: NodePool>(&self, forest: &mut Forest<P>, identity: Identity) -> bool {
        match self.lookup(identity) {
            Some(node) => {
                let refs = forest.node(node).refcount;
                forest.set_refcount(node, refs.saturating_add(1));
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.claims.len()
    }

    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }
}
