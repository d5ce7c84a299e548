//! Snapshot node record — one traced object in a captured forest.
//!
//! Nodes live in a `Forest` arena and refer to each other through `NodeId`
//! handles. The shape is first-child/next-sibling: a node owns the head of its
//! child list and every child owns the link to its next sibling.

use std::fmt;

use serde::{Deserialize, Serialize};


/// Object type tags reported by the host runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// Synthetic ingestion entry point; never describes a real object.
    #[default]
    Root,
    String,
    Table,
    Function,
    #[serde(rename = "userdata")]
    UserData,
    Thread,
}


impl NodeKind {
    /// Integer tag written to the `type` field of JSON dumps.
    pub fn code(self) -> i32 {
        match self {
            NodeKind::Root => 0,
            NodeKind::String => 4,
            NodeKind::Table => 5,
            NodeKind::Function => 6,
            NodeKind::UserData => 7,
            NodeKind::Thread => 8,
        }
    }

    pub fn from_code(code: i32) -> Option<NodeKind> {
        match code {
            0 => Some(NodeKind::Root),
            4 => Some(NodeKind::String),
            5 => Some(NodeKind::Table),
            6 => Some(NodeKind::Function),
            7 => Some(NodeKind::UserData),
            8 => Some(NodeKind::Thread),
            _ => None,
        }
    }

    /// Display name used as the prefix of a node label.
    pub fn name(self) -> &'static str {
        match self {
            NodeKind::Root => "root",
            NodeKind::String => "string",
            NodeKind::Table => "table",
            NodeKind::Function => "function",
            NodeKind::UserData => "userdata",
            NodeKind::Thread => "thread",
        }
    }

    pub const ALL: [NodeKind; 6] = [
        NodeKind::Root,
        NodeKind::String,
        NodeKind::Table,
        NodeKind::Function,
        NodeKind::UserData,
        NodeKind::Thread,
    ];
}


/// Marker carried by nodes produced by the diff engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DiffMarker {
    #[default]
    None,
    Added,
    Removed,
}


impl DiffMarker {
    /// Suffix appended to the description of a wholly new or vanished node.
    pub fn suffix(self) -> &'static str {
        match self {
            DiffMarker::None => "",
            DiffMarker::Added => "(+)",
            DiffMarker::Removed => "(-)",
        }
    }

    /// Suffix for a table whose recorded size changed by `delta`.
    pub fn delta_suffix(self, delta: u64) -> String {
        match self {
            DiffMarker::None => String::new(),
            DiffMarker::Added => format!("(+{})", delta),
            DiffMarker::Removed => format!("(-{})", delta),
        }
    }

    /// Single-character form used by the JSON `mark` field.
    pub fn symbol(self) -> Option<&'static str> {
        match self {
            DiffMarker::None => None,
            DiffMarker::Added => Some("+"),
            DiffMarker::Removed => Some("-"),
        }
    }

    pub fn from_symbol(symbol: &str) -> Option<DiffMarker> {
        match symbol {
            "+" => Some(DiffMarker::Added),
            "-" => Some(DiffMarker::Removed),
            _ => None,
        }
    }
}


/// Opaque identity token supplied by the walker. Compared and hashed, never
/// dereferenced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Identity(pub u64);


impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}


impl Identity {
    /// Recover the identity from a `"<kind>:0x<hex>"` label.
    pub fn from_label(label: &str) -> Option<Identity> {
        let (_, hex) = label.rsplit_once(':')?;
        let digits = hex.strip_prefix("0x").or_else(|| hex.strip_prefix("0X"))?;
        u64::from_str_radix(digits, 16).ok().map(Identity)
    }
}


/// Handle to a node slot inside a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);


impl NodeId {
    /// Handle for slot `index`. Meant for `NodePool` implementations.
    pub const fn new(index: u32) -> NodeId {
        NodeId(index)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}


/// One traced object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub label: String,
    pub refcount: u32,
    pub description: String,
    pub link: String,
    pub identity: Identity,
    pub marker: DiffMarker,
    pub(crate) first_child: Option<NodeId>,
    pub(crate) next_sibling: Option<NodeId>,
}


impl Node {
    /// Copy of the scalar fields with the child list and sibling link reset.
    pub fn detached(&self) -> Node {
        Node {
            first_child: None,
            next_sibling: None,
            ..self.clone()
        }
    }

    pub fn first_child(&self) -> Option<NodeId> {
        self.first_child
    }

    pub fn next_sibling(&self) -> Option<NodeId> {
        self.next_sibling
    }

    pub fn is_leaf(&self) -> bool {
        self.first_child.is_none()
    }
}


// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
