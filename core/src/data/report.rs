//! Tabular text report — one row per printed node with its full link path.
//!
//! Row layout: `label`, `refcount`, `description`, `full_link`, where
//! `full_link` joins the links from the printed root down to the node with
//! `.`. Leaves are always printed. Internal nodes are printed only when the
//! whole forest is a plain capture or when the node itself carries a diff
//! marker, so a diff report collapses unchanged hubs onto the changed paths.

use crate::graph::arena::NodePool;
use crate::graph::forest::Forest;
use crate::types::node::{DiffMarker, NodeId};


fn push_row(out: &mut String, name: &str, refs: &dyn std::fmt::Display, desc: &str, link: &str) {
    out.push_str(&format!("{:>26}\t{:>6}\t{:>18}\t{}\n", name, refs, desc, link));
}


/// The header line, newline-terminated.
pub fn header() -> String {
    let mut out = String::new();
    push_row(&mut out, "name", &"refs", "desc", "link");
    out
}


/// Render the report for the subtree at `root`. An absent forest renders as
/// an empty string, without a header.
pub fn render<P: NodePool>(forest: &Forest<P>, root: Option<NodeId>) -> String {
    let Some(root) = root else {
        return String::new();
    };
    let plain = forest.is_plain(Some(root));
    let mut out = header();
    let mut stack = vec![(root, forest.node(root).link.clone())];
    while let Some((id, full_link)) = stack.pop() {
        let node = forest.node(id);
        if node.is_leaf() || plain || node.marker != DiffMarker::None {
            push_row(&mut out, &node.label, &node.refcount, &node.description, &full_link);
        }
        let mark = stack.len();
        for child in forest.children(id) {
            let link = format!("{}.{}", full_link, forest.node(child).link);
            stack.push((child, link));
        }
        stack[mark..].reverse();
    }
    out
}


// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
