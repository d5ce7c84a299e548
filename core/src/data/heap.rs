//! Heap description — a YAML object graph and the walker that captures it.
//!
//! Lets the snapshot pipeline run without a live interpreter: each object
//! lists its kind, optional size/source hints, and its outgoing references.
//! References may form cycles; weak references are not followed.
//!
//! ```yaml
//! root: 1
//! objects:
//!   - id: 1
//!     kind: table
//!     refs:
//!       - { link: "_G", to: 2 }
//!   - id: 2
//!     kind: function
//!     source: "main.lua:10"
//! ```

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SnapError};
use crate::graph::arena::NodePool;
use crate::graph::ingest::{Capture, Walker};
use crate::types::node::{Identity, NodeId, NodeKind};


#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeapRef {
    pub link: String,
    pub to: u64,
    #[serde(default)]
    pub weak: bool,
}


#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeapObject {
    pub id: u64,
    pub kind: NodeKind,
    /// Entry count for tables. Defaults to the number of references.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// Definition site for functions, e.g. `main.lua:10`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Free-text description; replaces the derived one when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
    #[serde(default)]
    pub refs: Vec<HeapRef>,
}


impl HeapObject {
    /// Description recorded on the captured node.
    pub fn description(&self) -> String {
        if let Some(desc) = &self.desc {
            return desc.clone();
        }
        match self.kind {
            NodeKind::Table => {
                format!("(size: {})", self.size.unwrap_or(self.refs.len() as u64))
            }
            NodeKind::Function => match &self.source {
                Some(source) => format!("(func: {})", source),
                None => String::new(),
            },
            _ => String::new(),
        }
    }
}


#[derive(Debug, Clone, Default)]
pub struct HeapGraph {
    pub root: u64,
    pub objects: Vec<HeapObject>,
    by_id: HashMap<u64, usize>,
}


#[derive(Deserialize)]
struct HeapFile {
    root: u64,
    #[serde(default)]
    objects: Vec<HeapObject>,
}


impl HeapGraph {
    /// Parse and validate a heap description.
    ///
    /// Object ids must be unique, every reference and the root must name a
    /// declared object, and no object may claim the synthetic `root` kind.
    pub fn from_yaml(input: &str) -> Result<HeapGraph> {
        let file: HeapFile = serde_yaml::from_str(input)?;
        let mut by_id = HashMap::new();
        for (pos, object) in file.objects.iter().enumerate() {
            if object.kind == NodeKind::Root {
                return Err(SnapError::UnknownKind(NodeKind::Root.code()));
            }
            if by_id.insert(object.id, pos).is_some() {
                return Err(SnapError::DuplicateObject(object.id));
            }
        }
        if !by_id.contains_key(&file.root) {
            return Err(SnapError::UnknownObject(file.root));
        }
        for object in &file.objects {
            if let Some(missing) = object.refs.iter().find(|r| !by_id.contains_key(&r.to)) {
                return Err(SnapError::UnknownObject(missing.to));
            }
        }
        Ok(HeapGraph {
            root: file.root,
            objects: file.objects,
            by_id,
        })
    }

    pub fn load(path: &Path) -> Result<HeapGraph> {
        let text = std::fs::read_to_string(path).map_err(|e| SnapError::io(path, e))?;
        Self::from_yaml(&text)
    }

    pub fn get(&self, id: u64) -> Option<&HeapObject> {
        self.by_id.get(&id).map(|&pos| &self.objects[pos])
    }
}


/// Depth-first walker over a `HeapGraph`, references in listed order.
pub struct HeapWalker<'g> {
    graph: &'g HeapGraph,
    start: u64,
    root_link: String,
}


impl<'g> HeapWalker<'g> {
    pub fn new(graph: &'g HeapGraph, root_link: &str) -> Self {
        HeapWalker {
            graph,
            start: graph.root,
            root_link: root_link.to_string(),
        }
    }

    /// Start from another object instead of the declared root.
    pub fn starting_at(mut self, id: u64) -> Result<Self> {
        if self.graph.get(id).is_none() {
            return Err(SnapError::UnknownObject(id));
        }
        self.start = id;
        Ok(self)
    }
}


impl<'g> Walker for HeapWalker<'g> {
    fn walk<P: NodePool>(&mut self, capture: &mut Capture<'_, P>) {
        let mut stack: Vec<(NodeId, u64, &str)> =
            vec![(capture.root(), self.start, self.root_link.as_str())];
        while let Some((parent, id, link)) = stack.pop() {
            let Some(object) = self.graph.get(id) else {
                continue;
            };
            let Some(node) = capture.visit(parent, object.kind, Identity(id), link) else {
                continue;
            };
            capture.forest().set_description(node, &object.description());
            for reference in object.refs.iter().rev().filter(|r| !r.weak) {
                stack.push((node, reference.to, reference.link.as_str()));
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::forest::Forest;
    use crate::graph::ingest::capture;

    const SAMPLE: &str = r#"
root: 1
objects:
  - id: 1
    kind: table
    refs:
      - { link: "_G", to: 2 }
      - { link: "[key]", to: 3, weak: true }
  - id: 2
    kind: table
    size: 10
    refs:
      - { link: "print", to: 4 }
      - { link: "loop", to: 1 }
      - { link: "again", to: 4 }
  - id: 3
    kind: string
  - id: 4
    kind: function
    source: "main.lua:10"
"#;

    #[test]
    fn parses_objects() {
        let graph = HeapGraph::from_yaml(SAMPLE).unwrap();
        assert_eq!(graph.root, 1);
        assert_eq!(graph.objects.len(), 4);
        assert_eq!(graph.get(4).unwrap().kind, NodeKind::Function);
        assert!(graph.get(1).unwrap().refs[1].weak);
    }

    #[test]
    fn derived_descriptions() {
        let graph = HeapGraph::from_yaml(SAMPLE).unwrap();
        assert_eq!(graph.get(1).unwrap().description(), "(size: 2)");
        assert_eq!(graph.get(2).unwrap().description(), "(size: 10)");
        assert_eq!(graph.get(4).unwrap().description(), "(func: main.lua:10)");
        assert_eq!(graph.get(3).unwrap().description(), "");
    }

    #[test]
    fn duplicate_id_rejected() {
        let input = "root: 1\nobjects:\n  - { id: 1, kind: table }\n  - { id: 1, kind: string }\n";
        assert!(matches!(
            HeapGraph::from_yaml(input),
            Err(SnapError::DuplicateObject(1))
        ));
    }

    #[test]
    fn dangling_reference_rejected() {
        let input = "root: 1\nobjects:\n  - id: 1\n    kind: table\n    refs:\n      - { link: x, to: 9 }\n";
        assert!(matches!(
            HeapGraph::from_yaml(input),
            Err(SnapError::UnknownObject(9))
        ));
    }

    #[test]
    fn missing_root_rejected() {
        assert!(matches!(
            HeapGraph::from_yaml("root: 5\nobjects: []\n"),
            Err(SnapError::UnknownObject(5))
        ));
    }

    #[test]
    fn walk_dedups_cycles_and_skips_weak_refs() {
        let graph = HeapGraph::from_yaml(SAMPLE).unwrap();
        let mut forest = Forest::new();
        let mut walker = HeapWalker::new(&graph, "_REGISTRY_");
        let root = capture(&mut forest, &mut walker).unwrap();

        // 1 -> 2 -> 4; the string behind the weak ref is never reached.
        assert_eq!(forest.count(Some(root)), 3);
        assert_eq!(forest.node(root).link, "_REGISTRY_");
        // 1 is referenced again by "loop"
        assert_eq!(forest.node(root).refcount, 2);
        let g = forest.children(root).next().unwrap();
        assert_eq!(forest.node(g).link, "_G");
        assert_eq!(forest.node(g).description, "(size: 10)");
        let f = forest.children(g).next().unwrap();
        assert_eq!(forest.node(f).label, "function:0x4");
        assert_eq!(forest.node(f).link, "print");
        assert_eq!(forest.node(f).refcount, 2);
    }

    #[test]
    fn walk_from_other_start() {
        let graph = HeapGraph::from_yaml(SAMPLE).unwrap();
        let mut forest = Forest::new();
        let mut walker = HeapWalker::new(&graph, "G").starting_at(2).unwrap();
        let root = capture(&mut forest, &mut walker).unwrap();
        assert_eq!(forest.node(root).identity, Identity(2));
        assert_eq!(forest.count(Some(root)), 3);
        assert!(HeapWalker::new(&graph, "G").starting_at(77).is_err());
    }
}
