use std::collections::BTreeMap;
use std::path::Path;

use tracing::{debug, info};

use crate::command::Command;
use crate::data::heap::{HeapGraph, HeapWalker};
use crate::data::{self, OutputFormat};
use crate::error::{Result, SnapError};
use crate::graph::diff;
use crate::graph::forest::Forest;
use crate::graph::ingest::capture;
use crate::response::Response;
use crate::types::config::SnapSettings;
use crate::types::node::NodeId;


/// Central runtime for objsnap. Owns every snapshot in one forest and
/// dispatches commands against them by name.
///
/// A name may hold an empty snapshot (a capture that found nothing, or a
/// diff side with no changes).
pub struct Sys {
    forest: Forest,
    settings: SnapSettings,
    snapshots: BTreeMap<String, Option<NodeId>>,
}


impl Sys {
    pub fn new(settings: SnapSettings) -> Sys {
        Sys {
            forest: Forest::with_settings(&settings),
            settings,
            snapshots: BTreeMap::new(),
        }
    }

    /// Return a reference to the current settings.
    pub fn settings(&self) -> &SnapSettings {
        &self.settings
    }

    pub fn forest(&self) -> &Forest {
        &self.forest
    }

    /// Root of the snapshot stored under `name`.
    pub fn snapshot(&self, name: &str) -> Result<Option<NodeId>> {
        self.snapshots
            .get(name)
            .copied()
            .ok_or_else(|| SnapError::UnknownSnapshot(name.to_string()))
    }

    /// The single dispatch method.
    pub fn execute(&mut self, cmd: Command) -> Response {
        debug!(?cmd, "execute");
        let result = match cmd {
            Command::Capture { heap, name, root } => self.cmd_capture(&heap, name, root),
            Command::Load { path, name } => self.cmd_load(&path, name),
            Command::Copy { from, to } => self.cmd_copy(&from, to),
            Command::Save { name, path, format } => self.cmd_save(&name, &path, format),
            Command::Print { name, format } => self.cmd_print(&name, format),
            Command::Diff {
                base,
                target,
                added,
                removed,
            } => self.cmd_diff(&base, &target, added, removed),
            Command::Count { name } => self.cmd_count(&name),
            Command::Stat { name } => self.cmd_stat(&name),
            Command::Free { name } => self.cmd_free(&name),
            Command::List => Ok(self.cmd_list()),
            Command::Help { topic } => Ok(crate::help::help_text(topic.as_deref())),
        };
        result.into()
    }

    /// Put `root` under `name`, releasing whatever the name held before.
    fn store(&mut self, name: String, root: Option<NodeId>) {
        if let Some(old) = self.snapshots.insert(name, root) {
            self.forest.free_recursive(old);
        }
    }

    fn format(&self, format: OutputFormat) -> OutputFormat {
        match format {
            OutputFormat::Json if self.settings.pretty_json => OutputFormat::JsonPretty,
            other => other,
        }
    }

    // -----------------------------------------------------------------------
    // Snapshot sources
    // -----------------------------------------------------------------------

    fn cmd_capture(&mut self, heap: &str, name: String, root: Option<u64>) -> Result<String> {
        let graph = HeapGraph::load(Path::new(heap))?;
        let mut walker = HeapWalker::new(&graph, &self.settings.root_link);
        if let Some(id) = root {
            walker = walker.starting_at(id)?;
        }
        let snapshot = capture(&mut self.forest, &mut walker);
        let nodes = self.forest.count(snapshot);
        info!(heap, name = %name, nodes, "captured snapshot");
        let output = format!("captured '{}': {} nodes", name, nodes);
        self.store(name, snapshot);
        Ok(output)
    }

    fn cmd_load(&mut self, path: &str, name: String) -> Result<String> {
        let root = data::load(&mut self.forest, Path::new(path))?;
        let nodes = self.forest.count(Some(root));
        info!(path, name = %name, nodes, "loaded snapshot");
        let output = format!("loaded '{}': {} nodes", name, nodes);
        self.store(name, Some(root));
        Ok(output)
    }

    fn cmd_copy(&mut self, from: &str, to: String) -> Result<String> {
        let root = self.snapshot(from)?;
        let copy = self.forest.copy_all(root);
        let output = format!("copied '{}' to '{}'", from, to);
        self.store(to, copy);
        Ok(output)
    }

    // -----------------------------------------------------------------------
    // Output
    // -----------------------------------------------------------------------

    fn cmd_save(&self, name: &str, path: &str, format: OutputFormat) -> Result<String> {
        let root = self.snapshot(name)?;
        data::save(&self.forest, root, self.format(format), Path::new(path))?;
        Ok(format!("saved '{}' to {}", name, path))
    }

    fn cmd_print(&self, name: &str, format: OutputFormat) -> Result<String> {
        let root = self.snapshot(name)?;
        data::render(&self.forest, root, self.format(format))
    }

    // -----------------------------------------------------------------------
    // Analysis
    // -----------------------------------------------------------------------

    /// Diff two stored snapshots. Without either result name both sides are
    /// computed and stored as `added` and `removed`.
    fn cmd_diff(
        &mut self,
        base: &str,
        target: &str,
        added: Option<String>,
        removed: Option<String>,
    ) -> Result<String> {
        let base_root = self.snapshot(base)?;
        let target_root = self.snapshot(target)?;
        let (added, removed) = match (added, removed) {
            (None, None) => (Some("added".to_string()), Some("removed".to_string())),
            names => names,
        };
        let (incr, decr) = diff::diff(
            &mut self.forest,
            base_root,
            target_root,
            added.is_some(),
            removed.is_some(),
        );
        let mut lines = Vec::new();
        for (label, name, root) in [("added", added, incr), ("removed", removed, decr)] {
            if let Some(name) = name {
                lines.push(format!("{}: {} nodes -> '{}'", label, self.forest.count(root), name));
                self.store(name, root);
            }
        }
        Ok(lines.join("\n"))
    }

    fn cmd_count(&self, name: &str) -> Result<String> {
        let root = self.snapshot(name)?;
        Ok(self.forest.count(root).to_string())
    }

    fn cmd_stat(&self, name: &str) -> Result<String> {
        let root = self.snapshot(name)?;
        Ok(serde_json::to_string(&self.forest.stats(root))?)
    }

    // -----------------------------------------------------------------------
    // Bookkeeping
    // -----------------------------------------------------------------------

    fn cmd_free(&mut self, name: &str) -> Result<String> {
        let root = self
            .snapshots
            .remove(name)
            .ok_or_else(|| SnapError::UnknownSnapshot(name.to_string()))?;
        let nodes = self.forest.count(root);
        self.forest.free_recursive(root);
        Ok(format!("freed '{}': {} nodes", name, nodes))
    }

    fn cmd_list(&self) -> String {
        self.snapshots
            .iter()
            .map(|(name, root)| format!("{}\t{}", name, self.forest.count(*root)))
            .collect::<Vec<_>>()
            .join("\n")
    }
}


// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
