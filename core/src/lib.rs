//! objsnap core — capture object graphs as snapshot forests, diff them, and
//! write them out as JSON or text reports.

pub mod command;
pub mod data;
pub mod error;
pub mod graph;
pub mod help;
pub mod response;
pub mod sys;
pub mod types;

pub use error::{Result, SnapError};
pub use graph::arena::{Arena, NodePool};
pub use graph::forest::Forest;
pub use graph::ingest::{Capture, Walker};
pub use types::node::{DiffMarker, Identity, Node, NodeId, NodeKind};
