//! JSON dump of a snapshot forest, and the reader that rebuilds one.
//!
//! Shape: `{name, type, refs, desc, link, mark?, childs: [...]}` with
//! children in stored order. `mark` is present only on diff output (`"+"` or
//! `"-"`). The reader recovers each node's identity from the hex suffix of
//! `name`, so a dump can be diffed against another dump.
//!
//! Both directions handle forests of any depth. The writer walks the forest
//! with an explicit stack and emits text directly. The reader lifts
//! serde_json's nesting limit and grows the stack on demand while parsing.
//! Pretty output indents two spaces per level up to `MAX_INDENT` levels.
//! Deeper levels stay at that column, so output size stays linear in the
//! node count.

use serde::Deserialize;

use crate::error::{Result, SnapError};
use crate::graph::arena::NodePool;
use crate::graph::forest::Forest;
use crate::types::node::{DiffMarker, Identity, Node, NodeId, NodeKind};


/// Indentation levels after which pretty output stops shifting right.
pub const MAX_INDENT: usize = 16;


#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NodeDoc {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: i32,
    pub refs: u32,
    pub desc: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub mark: Option<String>,
    #[serde(default)]
    pub childs: Vec<NodeDoc>,
}


impl Drop for NodeDoc {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.childs);
        while let Some(mut doc) = pending.pop() {
            pending.append(&mut doc.childs);
        }
    }
}


impl NodeDoc {
    fn to_node(&self) -> Result<Node> {
        let kind = NodeKind::from_code(self.kind).ok_or(SnapError::UnknownKind(self.kind))?;
        let identity = Identity::from_label(&self.name)
            .ok_or_else(|| SnapError::InvalidLabel(self.name.clone()))?;
        let marker = self
            .mark
            .as_deref()
            .and_then(DiffMarker::from_symbol)
            .unwrap_or_default();
        Ok(Node {
            kind,
            label: self.name.clone(),
            refcount: self.refs,
            description: self.desc.clone(),
            link: self.link.clone(),
            identity,
            marker,
            ..Node::default()
        })
    }
}


// ---------------------------------------------------------------------------
// Writer
// ---------------------------------------------------------------------------

struct JsonWriter {
    out: String,
    pretty: bool,
}


impl JsonWriter {
    fn newline(&mut self, level: usize) {
        if self.pretty {
            self.out.push('\n');
            for _ in 0..level.min(MAX_INDENT) {
                self.out.push_str("  ");
            }
        }
    }

    fn key(&mut self, name: &str, level: usize) {
        self.newline(level);
        self.out.push('"');
        self.out.push_str(name);
        self.out.push_str(if self.pretty { "\": " } else { "\":" });
    }

    fn string(&mut self, value: &str) -> Result<()> {
        self.out.push_str(&serde_json::to_string(value)?);
        Ok(())
    }

    /// Everything of the node object up to and including `"childs":[`.
    /// `level` is the indentation of the object's own braces.
    fn open(&mut self, node: &Node, level: usize) -> Result<()> {
        self.out.push('{');
        self.key("name", level + 1);
        self.string(&node.label)?;
        self.out.push(',');
        self.key("type", level + 1);
        self.out.push_str(&node.kind.code().to_string());
        self.out.push(',');
        self.key("refs", level + 1);
        self.out.push_str(&node.refcount.to_string());
        self.out.push(',');
        self.key("desc", level + 1);
        self.string(&node.description)?;
        self.out.push(',');
        self.key("link", level + 1);
        self.string(&node.link)?;
        self.out.push(',');
        if let Some(mark) = node.marker.symbol() {
            self.key("mark", level + 1);
            self.string(mark)?;
            self.out.push(',');
        }
        self.key("childs", level + 1);
        self.out.push('[');
        Ok(())
    }

    fn close(&mut self, level: usize, had_children: bool) {
        if had_children {
            self.newline(level + 1);
        }
        self.out.push(']');
        self.newline(level);
        self.out.push('}');
    }
}


/// An object whose `childs` array is still being written.
struct Open {
    next: Option<NodeId>,
    level: usize,
    had_children: bool,
}


fn write<P: NodePool>(forest: &Forest<P>, root: NodeId, pretty: bool) -> Result<String> {
    let mut w = JsonWriter {
        out: String::new(),
        pretty,
    };
    w.open(forest.node(root), 0)?;
    let mut stack = vec![Open {
        next: forest.node(root).first_child(),
        level: 0,
        had_children: false,
    }];
    while let Some(top) = stack.last_mut() {
        let Some(child) = top.next else {
            let done = stack.pop();
            if let Some(done) = done {
                w.close(done.level, done.had_children);
            }
            continue;
        };
        top.next = forest.node(child).next_sibling();
        if top.had_children {
            w.out.push(',');
        }
        top.had_children = true;
        let level = top.level + 2;
        w.newline(level);
        w.open(forest.node(child), level)?;
        stack.push(Open {
            next: forest.node(child).first_child(),
            level,
            had_children: false,
        });
    }
    Ok(w.out)
}


/// Compact JSON text, or `None` for an absent forest.
pub fn to_string<P: NodePool>(forest: &Forest<P>, root: Option<NodeId>) -> Result<Option<String>> {
    root.map(|root| write(forest, root, false)).transpose()
}


/// Pretty-printed JSON text, or `None` for an absent forest.
pub fn to_string_pretty<P: NodePool>(
    forest: &Forest<P>,
    root: Option<NodeId>,
) -> Result<Option<String>> {
    root.map(|root| write(forest, root, true)).transpose()
}


// ---------------------------------------------------------------------------
// Reader
// ---------------------------------------------------------------------------

/// Rebuild a forest from a document tree. Child order round-trips.
pub fn from_doc<P: NodePool>(forest: &mut Forest<P>, doc: &NodeDoc) -> Result<NodeId> {
    let root = forest.insert(doc.to_node()?);
    let mut stack = vec![(doc, root)];
    while let Some((doc, parent)) = stack.pop() {
        // add_child prepends, so attach in reverse to keep document order.
        for child_doc in doc.childs.iter().rev() {
            let node = match child_doc.to_node() {
                Ok(node) => node,
                Err(e) => {
                    forest.free_recursive(Some(root));
                    return Err(e);
                }
            };
            let child = forest.insert(node);
            forest.add_child(parent, child);
            stack.push((child_doc, child));
        }
    }
    Ok(root)
}


/// Parse JSON text into a forest. Nesting depth is unbounded.
pub fn from_str<P: NodePool>(forest: &mut Forest<P>, input: &str) -> Result<NodeId> {
    let mut de = serde_json::Deserializer::from_str(input);
    de.disable_recursion_limit();
    let doc = NodeDoc::deserialize(serde_stacker::Deserializer::new(&mut de))?;
    de.end()?;
    from_doc(forest, &doc)
}


// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(forest: &mut Forest) -> NodeId {
        let root = forest.new_node(NodeKind::Table, "table", Identity(0x10));
        forest.set_link(root, "_G");
        forest.set_description(root, "(size: 2)");
        forest.set_refcount(root, 1);
        let f = forest.new_node(NodeKind::Function, "function", Identity(0x20));
        forest.set_link(f, "main");
        let s = forest.new_node(NodeKind::String, "string", Identity(0x30));
        forest.set_link(s, "name");
        forest.add_child(root, f);
        forest.add_child(root, s);
        root
    }

    fn chain(forest: &mut Forest, len: u64) -> NodeId {
        let root = forest.new_node(NodeKind::Table, "table", Identity(1));
        forest.set_link(root, "head");
        let mut parent = root;
        for id in 2..=len {
            let node = forest.new_node(NodeKind::Table, "table", Identity(id));
            forest.set_link(node, "next");
            forest.add_child(parent, node);
            parent = node;
        }
        root
    }

    #[test]
    fn compact_json_has_expected_fields() {
        let mut forest = Forest::new();
        let root = sample(&mut forest);
        let text = to_string(&forest, Some(root)).unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["name"], "table:0x10");
        assert_eq!(value["type"], 5);
        assert_eq!(value["refs"], 1);
        assert_eq!(value["desc"], "(size: 2)");
        assert_eq!(value["link"], "_G");
        assert!(value.get("mark").is_none());
        let childs = value["childs"].as_array().unwrap();
        assert_eq!(childs.len(), 2);
        // stored order: last attached first
        assert_eq!(childs[0]["link"], "name");
        assert_eq!(childs[1]["link"], "main");
        assert!(!text.contains('\n'));
    }

    #[test]
    fn compact_json_matches_serde_layout() {
        let mut forest = Forest::new();
        let root = forest.new_node(NodeKind::String, "string", Identity(0xff));
        forest.set_description(root, "say \"hi\"\n");
        forest.set_marker(root, DiffMarker::Removed);
        let text = to_string(&forest, Some(root)).unwrap().unwrap();
        assert_eq!(
            text,
            r#"{"name":"string:0xff","type":4,"refs":0,"desc":"say \"hi\"\n","link":"","mark":"-","childs":[]}"#
        );
    }

    #[test]
    fn pretty_json_uses_two_space_layout() {
        let mut forest = Forest::new();
        let root = forest.new_node(NodeKind::Table, "table", Identity(0x10));
        forest.set_link(root, "_G");
        forest.set_description(root, "(size: 1)");
        forest.set_refcount(root, 1);
        let f = forest.new_node(NodeKind::Function, "function", Identity(0x20));
        forest.set_link(f, "main");
        forest.add_child(root, f);
        let text = to_string_pretty(&forest, Some(root)).unwrap().unwrap();
        let expected = r#"{
  "name": "table:0x10",
  "type": 5,
  "refs": 1,
  "desc": "(size: 1)",
  "link": "_G",
  "childs": [
    {
      "name": "function:0x20",
      "type": 6,
      "refs": 0,
      "desc": "",
      "link": "main",
      "childs": []
    }
  ]
}"#;
        assert_eq!(text, expected);
    }

    #[test]
    fn absent_forest_has_no_text() {
        let forest = Forest::new();
        assert!(to_string(&forest, None).unwrap().is_none());
        assert!(to_string_pretty(&forest, None).unwrap().is_none());
    }

    #[test]
    fn reader_rebuilds_same_forest() {
        let mut forest = Forest::new();
        let root = sample(&mut forest);
        forest.set_marker(root, DiffMarker::Added);
        let text = to_string(&forest, Some(root)).unwrap().unwrap();
        let mut other = Forest::new();
        let loaded = from_str(&mut other, &text).unwrap();
        assert!(forest.same_shape(Some(root), &other, Some(loaded)));
        assert_eq!(other.node(loaded).identity, Identity(0x10));
        assert_eq!(other.node(loaded).marker, DiffMarker::Added);
    }

    #[test]
    fn deep_chain_round_trips_compact() {
        let mut forest = Forest::new();
        let root = chain(&mut forest, 100_000);
        let text = to_string(&forest, Some(root)).unwrap().unwrap();
        assert!(text.ends_with(&"]}".repeat(100_000)));
        let mut other = Forest::new();
        let loaded = from_str(&mut other, &text).unwrap();
        assert_eq!(other.count(Some(loaded)), 100_000);
        assert!(forest.same_shape(Some(root), &other, Some(loaded)));
    }

    #[test]
    fn deep_chain_round_trips_pretty() {
        let mut forest = Forest::new();
        let root = chain(&mut forest, 100_000);
        let text = to_string_pretty(&forest, Some(root)).unwrap().unwrap();
        let widest = text.lines().map(|l| l.len() - l.trim_start().len()).max();
        assert_eq!(widest, Some(2 * MAX_INDENT));
        let mut other = Forest::new();
        let loaded = from_str(&mut other, &text).unwrap();
        assert_eq!(other.count(Some(loaded)), 100_000);
    }

    #[test]
    fn reader_rejects_trailing_text() {
        let mut forest = Forest::new();
        let text = r#"{"name":"table:0x1","type":5,"refs":1,"desc":"","childs":[]} x"#;
        assert!(matches!(from_str(&mut forest, text), Err(SnapError::Json(_))));
    }

    #[test]
    fn reader_rejects_label_without_identity() {
        let mut forest = Forest::new();
        let text = r#"{"name":"table","type":5,"refs":1,"desc":"","childs":[]}"#;
        assert!(matches!(
            from_str(&mut forest, text),
            Err(SnapError::InvalidLabel(_))
        ));
    }

    #[test]
    fn reader_releases_partial_tree_on_error() {
        let mut forest = Forest::new();
        let text = r#"{"name":"table:0x1","type":5,"refs":1,"desc":"","childs":[
            {"name":"table:0x2","type":5,"refs":1,"desc":"","childs":[]},
            {"name":"table:0x3","type":42,"refs":1,"desc":"","childs":[]}
        ]}"#;
        assert!(matches!(
            from_str(&mut forest, text),
            Err(SnapError::UnknownKind(42))
        ));
        assert_eq!(forest.pool().live(), 0);
    }

    #[test]
    fn reader_accepts_dump_without_link() {
        let mut forest = Forest::new();
        let text = r#"{"name":"userdata:0xff","type":7,"refs":2,"desc":"x","childs":[]}"#;
        let root = from_str(&mut forest, text).unwrap();
        assert_eq!(forest.node(root).link, "");
        assert_eq!(forest.node(root).kind, NodeKind::UserData);
        assert_eq!(forest.node(root).refcount, 2);
    }
}
