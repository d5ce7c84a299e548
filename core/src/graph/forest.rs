//! Snapshot forest — node construction and whole-subtree operations.
//!
//! A `Forest` wraps a `NodePool` and gives the first-child/next-sibling
//! structure its operations: creation, bounded field writes, prepend-only
//! child attachment, counting, shallow and deep copies, detaching, and
//! recursive release. Subtree walks use an explicit work stack, so none of
//! them consume call stack proportional to the depth of the captured graph.
//!
//! Children enumerate in reverse order of attachment: `add_child` prepends.
//! Serialized output depends on this order.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::graph::arena::{Arena, NodePool};
use crate::types::config::SnapSettings;
use crate::types::node::{DiffMarker, Identity, Node, NodeId, NodeKind};


/// Byte limits applied to node text fields at the API boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldLimits {
    pub label: usize,
    pub description: usize,
    pub link: usize,
}


impl FieldLimits {
    pub fn from_settings(settings: &SnapSettings) -> Self {
        FieldLimits {
            label: settings.label_max,
            description: settings.description_max,
            link: settings.link_max,
        }
    }
}


impl Default for FieldLimits {
    fn default() -> Self {
        FieldLimits::from_settings(&SnapSettings::default())
    }
}


/// Per-snapshot summary for the `stat` command.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ForestStats {
    pub nodes: usize,
    pub max_depth: usize,
    pub by_kind: BTreeMap<&'static str, usize>,
    pub added: usize,
    pub removed: usize,
}


pub struct Forest<P: NodePool = Arena> {
    pool: P,
    limits: FieldLimits,
}


impl Forest<Arena> {
    pub fn new() -> Self {
        Forest::with_pool(Arena::default(), FieldLimits::default())
    }

    /// Forest backed by an arena sized and limited from `settings`.
    pub fn with_settings(settings: &SnapSettings) -> Self {
        Forest::with_pool(
            Arena::new(settings.chunk_slots),
            FieldLimits::from_settings(settings),
        )
    }
}


impl Default for Forest<Arena> {
    fn default() -> Self {
        Forest::new()
    }
}


impl<P: NodePool> Forest<P> {
    pub fn with_pool(pool: P, limits: FieldLimits) -> Self {
        Forest { pool, limits }
    }

    pub fn pool(&self) -> &P {
        &self.pool
    }

    pub fn limits(&self) -> FieldLimits {
        self.limits
    }

    pub fn node(&self, id: NodeId) -> &Node {
        self.pool.node(id)
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        self.pool.node_mut(id)
    }

    // -----------------------------------------------------------------------
    // Construction and field writes
    // -----------------------------------------------------------------------

    /// Allocate a node labelled `"<type_label>:<identity>"`.
    pub fn new_node(&mut self, kind: NodeKind, type_label: &str, identity: Identity) -> NodeId {
        let label = clip(&format!("{}:{}", type_label, identity), self.limits.label);
        self.insert(Node {
            kind,
            label,
            identity,
            ..Node::default()
        })
    }

    /// Allocate a slot holding `node` with its links cleared.
    pub(crate) fn insert(&mut self, node: Node) -> NodeId {
        let id = self.pool.allocate();
        *self.pool.node_mut(id) = node.detached();
        id
    }

    /// Overwrite the description, keeping at most `limits.description` bytes.
    pub fn set_description(&mut self, id: NodeId, text: &str) {
        let text = clip(text, self.limits.description);
        self.node_mut(id).description = text;
    }

    /// Overwrite the link, keeping at most `limits.link` bytes.
    pub fn set_link(&mut self, id: NodeId, text: &str) {
        let text = clip(text, self.limits.link);
        self.node_mut(id).link = text;
    }

    /// Append a diff suffix. The suffix is never truncated.
    pub fn append_description(&mut self, id: NodeId, suffix: &str) {
        self.node_mut(id).description.push_str(suffix);
    }

    pub fn set_refcount(&mut self, id: NodeId, refcount: u32) {
        self.node_mut(id).refcount = refcount;
    }

    pub fn set_marker(&mut self, id: NodeId, marker: DiffMarker) {
        self.node_mut(id).marker = marker;
    }

    /// Prepend `child` to `parent`'s child list.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) {
        let head = self.node(parent).first_child;
        self.node_mut(child).next_sibling = head;
        self.node_mut(parent).first_child = Some(child);
    }

    /// Take the head of `parent`'s child list off the parent.
    ///
    /// The rest of the list stays attached to the returned node's sibling
    /// link; callers detaching a sentinel's only child get a lone root.
    pub fn detach_first_child(&mut self, parent: NodeId) -> Option<NodeId> {
        self.node_mut(parent).first_child.take()
    }

    // -----------------------------------------------------------------------
    // Traversal
    // -----------------------------------------------------------------------

    /// Children of `id` in stored order.
    pub fn children(&self, id: NodeId) -> Children<'_, P> {
        Children {
            forest: self,
            next: self.node(id).first_child,
        }
    }

    /// Pre-order walk of the subtree at `root` with depths (root = 0).
    /// Siblings of `root` are not visited.
    pub fn descendants(&self, root: Option<NodeId>) -> Descendants<'_, P> {
        Descendants {
            forest: self,
            stack: root.map(|id| vec![(id, 0)]).unwrap_or_default(),
        }
    }

    /// Inclusive subtree size. `count(None) == 0`.
    pub fn count(&self, root: Option<NodeId>) -> usize {
        self.descendants(root).count()
    }

    pub fn stats(&self, root: Option<NodeId>) -> ForestStats {
        let mut stats = ForestStats::default();
        for (id, depth) in self.descendants(root) {
            let node = self.node(id);
            stats.nodes += 1;
            stats.max_depth = stats.max_depth.max(depth);
            *stats.by_kind.entry(node.kind.name()).or_insert(0) += 1;
            match node.marker {
                DiffMarker::Added => stats.added += 1,
                DiffMarker::Removed => stats.removed += 1,
                DiffMarker::None => {}
            }
        }
        stats
    }

    /// True when no node under `root` carries a diff marker.
    pub fn is_plain(&self, root: Option<NodeId>) -> bool {
        self.descendants(root)
            .all(|(id, _)| self.node(id).marker == DiffMarker::None)
    }

    // -----------------------------------------------------------------------
    // Copies
    // -----------------------------------------------------------------------

    /// Copy one node's scalar fields into a fresh slot.
    pub fn copy(&mut self, id: Option<NodeId>) -> Option<NodeId> {
        let node = self.node(id?).detached();
        Some(self.insert(node))
    }

    /// Deep copy of the subtree at `id`, children in the same order.
    pub fn copy_all(&mut self, id: Option<NodeId>) -> Option<NodeId> {
        let src_root = id?;
        let dst_root = self.copy(Some(src_root))?;
        let mut stack = vec![(src_root, dst_root)];
        while let Some((src, dst)) = stack.pop() {
            let mut prev: Option<NodeId> = None;
            let mut child = self.node(src).first_child;
            while let Some(c) = child {
                let copied = self.insert(self.node(c).detached());
                match prev {
                    None => self.node_mut(dst).first_child = Some(copied),
                    Some(p) => self.node_mut(p).next_sibling = Some(copied),
                }
                prev = Some(copied);
                stack.push((c, copied));
                child = self.node(c).next_sibling;
            }
        }
        Some(dst_root)
    }

    // -----------------------------------------------------------------------
    // Release
    // -----------------------------------------------------------------------

    /// Release every descendant of `id`, then `id` itself. Siblings of `id`
    /// are left alone.
    pub fn free_recursive(&mut self, id: Option<NodeId>) {
        let order: Vec<NodeId> = self.descendants(id).map(|(n, _)| n).collect();
        // Reverse pre-order releases every child before its parent.
        for node in order.into_iter().rev() {
            self.pool.release(node);
        }
    }

    /// Drop every node in the pool at once.
    pub fn free_all(&mut self) {
        self.pool.free_all();
    }

    /// Field-by-field and shape equality of two subtrees, possibly in
    /// different forests.
    pub fn same_shape<Q: NodePool>(
        &self,
        a: Option<NodeId>,
        other: &Forest<Q>,
        b: Option<NodeId>,
    ) -> bool {
        // The third element says whether sibling links are compared too; the
        // two roots may sit in unrelated sibling lists.
        let mut stack = vec![(a, b, false)];
        while let Some((left, right, siblings)) = stack.pop() {
            match (left, right) {
                (None, None) => {}
                (Some(x), Some(y)) => {
                    let (nx, ny) = (self.node(x), other.node(y));
                    if nx.kind != ny.kind
                        || nx.label != ny.label
                        || nx.refcount != ny.refcount
                        || nx.description != ny.description
                        || nx.link != ny.link
                        || nx.marker != ny.marker
                    {
                        return false;
                    }
                    stack.push((nx.first_child, ny.first_child, true));
                    if siblings {
                        stack.push((nx.next_sibling, ny.next_sibling, true));
                    }
                }
                _ => return false,
            }
        }
        true
    }
}


pub struct Children<'a, P: NodePool> {
    forest: &'a Forest<P>,
    next: Option<NodeId>,
}


impl<'a, P: NodePool> Iterator for Children<'a, P> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.next?;
        self.next = self.forest.node(id).next_sibling;
        Some(id)
    }
}


pub struct Descendants<'a, P: NodePool> {
    forest: &'a Forest<P>,
    stack: Vec<(NodeId, usize)>,
}


impl<'a, P: NodePool> Iterator for Descendants<'a, P> {
    type Item = (NodeId, usize);

    fn next(&mut self) -> Option<(NodeId, usize)> {
        let (id, depth) = self.stack.pop()?;
        let mark = self.stack.len();
        for child in self.forest.children(id) {
            self.stack.push((child, depth + 1));
        }
        // Keep stored order: first child on top of the stack.
        self.stack[mark..].reverse();
        Some((id, depth))
    }
}


/// Cut `text` to at most `max` bytes on a character boundary.
pub(crate) fn clip(text: &str, max: usize) -> String {
    if text.len() <= max {
        return text.to_string();
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    text[..end].to_string()
}


// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
