//! Diff engine — skeleton forests of what appeared or vanished between two
//! captures.
//!
//! `added(base, target)` indexes every identity of `base`, then walks
//! `target`. A node whose identity is unknown to the index is new: its whole
//! subtree is copied and every copied node is marked. A known node is kept
//! only as a shallow copy on the path to some change below it, or when it is
//! a table whose recorded size grew. `removed` is the same walk with the two
//! forests swapped. On that side the kept shallow copy is the walked base
//! node, so a shrunken table reports its old size next to `(-N)`; the C
//! luasnapshot copies the matched target node and shows the new size.
//!
//! The result is a skeleton rather than a flat list so a report shows under
//! which parent each object appeared or disappeared.
//!
//! Identities are compared as opaque tokens. If the host reuses a token for an
//! unrelated object between the two captures, that object is treated as the
//! old one.

use tracing::debug;

use crate::graph::arena::NodePool;
use crate::graph::forest::Forest;
use crate::graph::index::IdentityIndex;
use crate::types::node::{DiffMarker, NodeId, NodeKind};


/// Skeleton of the nodes of `target` that are absent from `base`.
pub fn added<P: NodePool>(
    forest: &mut Forest<P>,
    base: Option<NodeId>,
    target: Option<NodeId>,
) -> Option<NodeId> {
    let (base, target) = (base?, target?);
    let index = IdentityIndex::build(forest, Some(base));
    let result = skeleton(forest, &index, target, DiffMarker::Added);
    debug!(nodes = forest.count(result), "computed added skeleton");
    result
}


/// Skeleton of the nodes of `base` that are absent from `target`.
pub fn removed<P: NodePool>(
    forest: &mut Forest<P>,
    base: Option<NodeId>,
    target: Option<NodeId>,
) -> Option<NodeId> {
    let (base, target) = (base?, target?);
    let index = IdentityIndex::build(forest, Some(target));
    let result = skeleton(forest, &index, base, DiffMarker::Removed);
    debug!(nodes = forest.count(result), "computed removed skeleton");
    result
}


/// Both directions at once. A side that is not wanted is not computed and
/// comes back as `None`; so does everything when either input is absent.
pub fn diff<P: NodePool>(
    forest: &mut Forest<P>,
    base: Option<NodeId>,
    target: Option<NodeId>,
    want_added: bool,
    want_removed: bool,
) -> (Option<NodeId>, Option<NodeId>) {
    if base.is_none() || target.is_none() {
        return (None, None);
    }
    let incr = if want_added { added(forest, base, target) } else { None };
    let decr = if want_removed { removed(forest, base, target) } else { None };
    (incr, decr)
}


/// Size recorded in a table description: the first run of ASCII digits, or
/// 0 when there is none. `"(size: 10)"` gives 10.
pub fn recorded_size(description: &str) -> u64 {
    description
        .bytes()
        .skip_while(|b| !b.is_ascii_digit())
        .take_while(|b| b.is_ascii_digit())
        .fold(0u64, |acc, b| {
            acc.saturating_mul(10).saturating_add(u64::from(b - b'0'))
        })
}


/// A matched node whose children are still being examined.
struct Frame {
    walked: NodeId,
    matched: NodeId,
    next_child: Option<NodeId>,
    results: Vec<NodeId>,
}


enum Entered {
    Done(Option<NodeId>),
    Open(Frame),
}


fn skeleton<P: NodePool>(
    forest: &mut Forest<P>,
    index: &IdentityIndex,
    start: NodeId,
    marker: DiffMarker,
) -> Option<NodeId> {
    let mut stack = match enter(forest, index, start, marker) {
        Entered::Done(result) => return result,
        Entered::Open(frame) => vec![frame],
    };
    loop {
        let next = match stack.last_mut() {
            Some(top) => top.next_child,
            None => return None,
        };
        if let Some(child) = next {
            if let Some(top) = stack.last_mut() {
                top.next_child = forest.node(child).next_sibling();
            }
            match enter(forest, index, child, marker) {
                Entered::Done(Some(result)) => {
                    if let Some(top) = stack.last_mut() {
                        top.results.push(result);
                    }
                }
                Entered::Done(None) => {}
                Entered::Open(frame) => stack.push(frame),
            }
            continue;
        }
        let Some(frame) = stack.pop() else {
            return None;
        };
        let result = close(forest, frame, marker);
        match stack.last_mut() {
            Some(parent) => parent.results.extend(result),
            None => return result,
        }
    }
}


fn enter<P: NodePool>(
    forest: &mut Forest<P>,
    index: &IdentityIndex,
    walked: NodeId,
    marker: DiffMarker,
) -> Entered {
    match index.lookup(forest.node(walked).identity) {
        None => Entered::Done(mark_subtree(forest, walked, marker)),
        Some(matched) => Entered::Open(Frame {
            walked,
            matched,
            next_child: forest.node(walked).first_child(),
            results: Vec::new(),
        }),
    }
}


/// Deep-copy a subtree that has no counterpart and mark every copied node.
fn mark_subtree<P: NodePool>(
    forest: &mut Forest<P>,
    walked: NodeId,
    marker: DiffMarker,
) -> Option<NodeId> {
    let copy = forest.copy_all(Some(walked))?;
    let ids: Vec<NodeId> = forest.descendants(Some(copy)).map(|(id, _)| id).collect();
    for id in ids {
        forest.set_marker(id, marker);
        forest.append_description(id, marker.suffix());
    }
    Some(copy)
}


/// Build the shallow copy for a matched node once all its children are done.
fn close<P: NodePool>(forest: &mut Forest<P>, frame: Frame, marker: DiffMarker) -> Option<NodeId> {
    let Frame {
        walked,
        matched,
        results,
        ..
    } = frame;
    let mut out = None;
    if !results.is_empty() {
        let copy = forest.copy(Some(walked))?;
        link_children(forest, copy, &results);
        out = Some(copy);
    }
    if forest.node(walked).kind == NodeKind::Table {
        let walked_size = recorded_size(&forest.node(walked).description);
        let matched_size = recorded_size(&forest.node(matched).description);
        if walked_size > matched_size {
            let copy = match out {
                Some(copy) => copy,
                None => forest.copy(Some(walked))?,
            };
            forest.set_marker(copy, marker);
            forest.append_description(copy, &marker.delta_suffix(walked_size - matched_size));
            out = Some(copy);
        }
    }
    out
}


/// Attach `children` under `parent` keeping their order.
fn link_children<P: NodePool>(forest: &mut Forest<P>, parent: NodeId, children: &[NodeId]) {
    for &child in children.iter().rev() {
        forest.add_child(parent, child);
    }
}


// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
