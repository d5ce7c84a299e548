//! Error type shared by the snapshot engine, serializers, and command layer.
//!
//! Absent or empty forests are not errors; they travel as `None`. Only I/O,
//! parse failures, and references to unknown names end up here.

use std::path::Path;

use thiserror::Error;


#[derive(Error, Debug)]
pub enum SnapError {
    #[error("file I/O error: {source}; path: '{}'", .path.display())]
    Io {
        path: Box<Path>,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid snapshot JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("label '{0}' does not end in a hex identity")]
    InvalidLabel(String),

    #[error("unknown node type tag {0}")]
    UnknownKind(i32),

    #[error("heap refers to unknown object {0:#x}")]
    UnknownObject(u64),

    #[error("heap declares object {0:#x} more than once")]
    DuplicateObject(u64),

    #[error("no snapshot named '{0}'")]
    UnknownSnapshot(String),
}


impl SnapError {
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> SnapError {
        SnapError::Io {
            path: path.as_ref().into(),
            source,
        }
    }
}


pub type Result<T> = std::result::Result<T, SnapError>;
