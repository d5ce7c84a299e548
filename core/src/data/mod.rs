//! Snapshot data formats — JSON dumps, text reports, heap descriptions.
//!
//! The `json` module writes and reads the JSON tree dump. The `report`
//! module renders the path-annotated text table. The `heap` module parses a
//! YAML object-graph description and walks it into a capture. This module
//! ties the two output formats to file targets.

pub mod heap;
pub mod json;
pub mod report;

use std::io::Write;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Result, SnapError};
use crate::graph::arena::NodePool;
use crate::graph::forest::Forest;
use crate::types::node::NodeId;


/// Output format for printing or saving a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum OutputFormat {
    #[serde(rename = "json")]
    #[default]
    Json,
    #[serde(rename = "jsonfmt")]
    JsonPretty,
    #[serde(rename = "report")]
    Report,
}


impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, String> {
        match s {
            "json" => Ok(OutputFormat::Json),
            "jsonfmt" => Ok(OutputFormat::JsonPretty),
            "report" => Ok(OutputFormat::Report),
            _ => Err(format!(
                "Unknown format '{}'. Expected json, jsonfmt, or report.",
                s
            )),
        }
    }
}


/// Render a snapshot as text. An absent forest renders as an empty string.
pub fn render<P: NodePool>(
    forest: &Forest<P>,
    root: Option<NodeId>,
    format: OutputFormat,
) -> Result<String> {
    let text = match format {
        OutputFormat::Json => json::to_string(forest, root)?,
        OutputFormat::JsonPretty => json::to_string_pretty(forest, root)?,
        OutputFormat::Report => Some(report::render(forest, root)),
    };
    Ok(text.unwrap_or_default())
}


/// Write a snapshot to `path`, replacing any previous content.
///
/// JSON goes through a temporary file in the same directory that is renamed
/// over the target. Reports truncate and rewrite the target in place. An
/// absent forest leaves a zero-byte file either way.
pub fn save<P: NodePool>(
    forest: &Forest<P>,
    root: Option<NodeId>,
    format: OutputFormat,
    path: &Path,
) -> Result<()> {
    let text = render(forest, root, format)?;
    match format {
        OutputFormat::Json | OutputFormat::JsonPretty => write_atomic(path, text.as_bytes())?,
        OutputFormat::Report => {
            std::fs::write(path, text.as_bytes()).map_err(|e| SnapError::io(path, e))?
        }
    }
    info!(path = %path.display(), bytes = text.len(), ?format, "snapshot written");
    Ok(())
}


/// Replace `path` with `bytes` via a renamed temporary file.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| SnapError::io(dir, e))?;
    tmp.write_all(bytes).map_err(|e| SnapError::io(tmp.path(), e))?;
    tmp.as_file().sync_all().map_err(|e| SnapError::io(tmp.path(), e))?;
    tmp.persist(path).map_err(|e| SnapError::io(path, e.error))?;
    Ok(())
}


/// Read a JSON dump from `path` into `forest`.
pub fn load<P: NodePool>(forest: &mut Forest<P>, path: &Path) -> Result<NodeId> {
    let text = std::fs::read_to_string(path).map_err(|e| SnapError::io(path, e))?;
    json::from_str(forest, &text)
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::node::{Identity, NodeKind};

    fn one_node(forest: &mut Forest) -> NodeId {
        let root = forest.new_node(NodeKind::Table, "table", Identity(0xabc));
        forest.set_link(root, "_G");
        root
    }

    #[test]
    fn format_parses_from_cli_names() {
        assert_eq!("json".parse::<OutputFormat>(), Ok(OutputFormat::Json));
        assert_eq!("jsonfmt".parse::<OutputFormat>(), Ok(OutputFormat::JsonPretty));
        assert_eq!("report".parse::<OutputFormat>(), Ok(OutputFormat::Report));
        assert!("xml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snap.json");
        let mut forest = Forest::new();
        let root = one_node(&mut forest);
        save(&forest, Some(root), OutputFormat::JsonPretty, &path).unwrap();
        let loaded = load(&mut forest, &path).unwrap();
        assert!(forest.same_shape(Some(root), &forest, Some(loaded)));
    }

    #[test]
    fn deep_snapshot_survives_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut forest = Forest::new();
        let root = one_node(&mut forest);
        let mut tail = root;
        for i in 1..5_000u64 {
            let next = forest.new_node(NodeKind::Table, "table", Identity(0xabc + i));
            forest.set_link(next, "next");
            forest.add_child(tail, next);
            tail = next;
        }
        for (name, format) in [("deep.json", OutputFormat::Json), ("deep-fmt.json", OutputFormat::JsonPretty)] {
            let path = dir.path().join(name);
            save(&forest, Some(root), format, &path).unwrap();
            let loaded = load(&mut forest, &path).unwrap();
            assert_eq!(forest.count(Some(loaded)), 5_000);
            assert!(forest.same_shape(Some(root), &forest, Some(loaded)));
            forest.free_recursive(Some(loaded));
        }
    }

    #[test]
    fn save_replaces_previous_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snap.txt");
        std::fs::write(&path, "x".repeat(10_000)).unwrap();
        let mut forest = Forest::new();
        let root = one_node(&mut forest);
        save(&forest, Some(root), OutputFormat::Report, &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 2);
        assert!(!text.contains("xxx"));
    }

    #[test]
    fn empty_forest_truncates_target() {
        let dir = tempfile::tempdir().unwrap();
        let forest = Forest::new();
        for (name, format) in [("a.txt", OutputFormat::Report), ("a.json", OutputFormat::Json)] {
            let path = dir.path().join(name);
            std::fs::write(&path, "stale").unwrap();
            save(&forest, None, format, &path).unwrap();
            assert_eq!(std::fs::metadata(&path).unwrap().len(), 0);
        }
    }

    #[test]
    fn unwritable_target_is_reported() {
        let forest = Forest::new();
        let path = Path::new("/nonexistent-objsnap-dir/out.txt");
        assert!(matches!(
            save(&forest, None, OutputFormat::Report, path),
            Err(SnapError::Io { .. })
        ));
    }

    #[test]
    fn missing_dump_is_io_error() {
        let mut forest = Forest::new();
        assert!(matches!(
            load(&mut forest, Path::new("/nonexistent/snap.json")),
            Err(SnapError::Io { .. })
        ));
    }
}
