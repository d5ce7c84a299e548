//! Snapshot forest — storage, traversal, ingestion, and comparison.
//!
//! The `arena` module hands out node slots from fixed-size chunks behind the
//! `NodePool` seam. The `forest` module builds first-child/next-sibling trees
//! on top of a pool and owns copy, release, and traversal. The `index` module
//! maps object identities to nodes for one capture or diff. The `ingest`
//! module is the API a walker drives while it traverses a live object graph.
//! The `diff` module derives added/removed skeletons from two captures.

pub mod arena;
pub mod diff;
pub mod forest;
pub mod index;
pub mod ingest;
