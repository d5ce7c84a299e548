//! Ingestion API — what a walker calls while it traverses live objects.
//!
//! A `Capture` owns the identity index for one pass and a synthetic Root
//! sentinel that serves as the first parent. The walker asks `visit` before
//! descending into any object: a `None` answer means the object was already
//! captured (its refcount went up) and its referents must not be walked
//! again. That rule is what turns a cyclic reference graph into a finite
//! forest. `finish` detaches the real top-level node from the sentinel.

use tracing::debug;

use crate::graph::arena::{Arena, NodePool};
use crate::graph::forest::Forest;
use crate::graph::index::IdentityIndex;
use crate::types::node::{Identity, NodeId, NodeKind};


/// A traversal of some host's object graph.
///
/// Implementations decide traversal order and which references are weak;
/// they must keep the graph stable for the duration of `walk`.
pub trait Walker {
    fn walk<P: NodePool>(&mut self, capture: &mut Capture<'_, P>);
}


/// One ingestion pass over a forest.
pub struct Capture<'f, P: NodePool = Arena> {
    forest: &'f mut Forest<P>,
    index: IdentityIndex,
    sentinel: NodeId,
}


impl<'f, P: NodePool> Capture<'f, P> {
    pub fn begin(forest: &'f mut Forest<P>) -> Self {
        let sentinel = forest.new_node(NodeKind::Root, NodeKind::Root.name(), Identity(0));
        Capture {
            forest,
            index: IdentityIndex::new(),
            sentinel,
        }
    }

    /// The synthetic parent for the walker's first object.
    pub fn root(&self) -> NodeId {
        self.sentinel
    }

    /// Field access for `set_description` / `set_link` during the pass.
    pub fn forest(&mut self) -> &mut Forest<P> {
        self.forest
    }

    /// True if `identity` was already captured in this pass; bumps its
    /// refcount in that case.
    pub fn is_marked(&mut self, identity: Identity) -> bool {
        self.index.is_marked(self.forest, identity)
    }

    /// Claim `identity` for `node`. Returns false if it was already claimed.
    pub fn register(&mut self, identity: Identity, node: NodeId) -> bool {
        self.index.claim(identity, node)
    }

    /// Create, claim, and attach a node for a first-seen object.
    ///
    /// Returns `None` when the object was already captured; the walker must
    /// then skip its referents.
    pub fn visit(
        &mut self,
        parent: NodeId,
        kind: NodeKind,
        identity: Identity,
        link: &str,
    ) -> Option<NodeId> {
        if self.is_marked(identity) {
            return None;
        }
        let node = self.forest.new_node(kind, kind.name(), identity);
        self.forest.set_refcount(node, 1);
        self.forest.set_link(node, link);
        self.forest.add_child(parent, node);
        self.register(identity, node);
        Some(node)
    }

    /// Detach the captured forest from the sentinel and release the sentinel.
    ///
    /// Only the most recently attached top-level node is kept; any other
    /// top-level nodes are released.
    pub fn finish(self) -> Option<NodeId> {
        let root = self.forest.detach_first_child(self.sentinel);
        if let Some(root) = root {
            let mut stray = self.forest.node_mut(root).next_sibling.take();
            while let Some(id) = stray {
                stray = self.forest.node(id).next_sibling;
                self.forest.free_recursive(Some(id));
            }
        }
        self.forest.free_recursive(Some(self.sentinel));
        debug!(
            nodes = self.forest.count(root),
            identities = self.index.len(),
            "capture pass finished"
        );
        root
    }
}


/// Run `walker` over a fresh pass and return the captured root.
pub fn capture<P: NodePool, W: Walker>(forest: &mut Forest<P>, walker: &mut W) -> Option<NodeId> {
    let mut pass = Capture::begin(forest);
    walker.walk(&mut pass);
    pass.finish()
}


#[cfg(test)]
mod tests {
    use super::*;

    /// Adjacency-list graph: (identity, kind, [(link, target)]).
    struct ListWalker {
        objects: Vec<(u64, NodeKind, Vec<(&'static str, u64)>)>,
        start: u64,
    }

    impl ListWalker {
        fn descend<P: NodePool>(&self, capture: &mut Capture<'_, P>, parent: NodeId, id: u64, link: &str) {
            let Some((_, kind, refs)) = self.objects.iter().find(|(o, _, _)| *o == id) else {
                return;
            };
            if let Some(node) = capture.visit(parent, *kind, Identity(id), link) {
                for (child_link, target) in refs {
                    self.descend(capture, node, *target, child_link);
                }
            }
        }
    }

    impl Walker for ListWalker {
        fn walk<P: NodePool>(&mut self, capture: &mut Capture<'_, P>) {
            let root = capture.root();
            self.descend(capture, root, self.start, "_G");
        }
    }

    #[test]
    fn cycle_collapses_into_finite_tree() {
        // 1 -> 2 -> 3 -> 1
        let mut walker = ListWalker {
            objects: vec![
                (1, NodeKind::Table, vec![("a", 2)]),
                (2, NodeKind::Table, vec![("b", 3)]),
                (3, NodeKind::Function, vec![("up", 1)]),
            ],
            start: 1,
        };
        let mut forest = Forest::new();
        let root = capture(&mut forest, &mut walker);
        assert_eq!(forest.count(root), 3);
        let root = root.unwrap();
        assert_eq!(forest.node(root).link, "_G");
        assert_eq!(forest.node(root).refcount, 2);
    }

    #[test]
    fn shared_object_counted_once_with_refcount() {
        // 1 -> {x: 2, y: 2}
        let mut walker = ListWalker {
            objects: vec![
                (1, NodeKind::Table, vec![("x", 2), ("y", 2)]),
                (2, NodeKind::String, vec![]),
            ],
            start: 1,
        };
        let mut forest = Forest::new();
        let root = capture(&mut forest, &mut walker).unwrap();
        assert_eq!(forest.count(Some(root)), 2);
        let shared = forest.children(root).next().unwrap();
        assert_eq!(forest.node(shared).refcount, 2);
        assert_eq!(forest.node(shared).link, "x");
        assert_eq!(forest.node(shared).label, "string:0x2");
    }

    #[test]
    fn sentinel_is_released() {
        let mut walker = ListWalker {
            objects: vec![(1, NodeKind::Table, vec![])],
            start: 1,
        };
        let mut forest = Forest::new();
        let root = capture(&mut forest, &mut walker);
        assert_eq!(forest.pool().live(), 1);
        assert_eq!(forest.node(root.unwrap()).kind, NodeKind::Table);
    }

    #[test]
    fn empty_walk_yields_no_root() {
        let mut walker = ListWalker {
            objects: vec![],
            start: 1,
        };
        let mut forest = Forest::new();
        assert_eq!(capture(&mut forest, &mut walker), None);
        assert_eq!(forest.pool().live(), 0);
    }

    #[test]
    fn extra_top_level_nodes_are_released() {
        let mut forest = Forest::new();
        let mut pass = Capture::begin(&mut forest);
        let sentinel = pass.root();
        pass.visit(sentinel, NodeKind::Table, Identity(1), "first");
        pass.visit(sentinel, NodeKind::Table, Identity(2), "second");
        let root = pass.finish().unwrap();
        assert_eq!(forest.node(root).link, "second");
        assert!(forest.node(root).next_sibling().is_none());
        assert_eq!(forest.pool().live(), 1);
    }
}
