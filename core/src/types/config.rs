use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SnapError};


#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapSettings {
    /// Node slots per arena chunk. Default: 32.
    #[serde(default = "default_chunk_slots")]
    pub chunk_slots: usize,
    /// Maximum bytes kept in a node label. Default: 31.
    #[serde(default = "default_label_max")]
    pub label_max: usize,
    /// Maximum bytes kept by `set_description`. Default: 63.
    #[serde(default = "default_description_max")]
    pub description_max: usize,
    /// Maximum bytes kept by `set_link`. Default: 31.
    #[serde(default = "default_link_max")]
    pub link_max: usize,
    /// Pretty-print JSON dumps. Default: false.
    #[serde(default)]
    pub pretty_json: bool,
    /// Link given to the object a capture starts from. Default: `_REGISTRY_`.
    #[serde(default = "default_root_link")]
    pub root_link: String,
}

fn default_chunk_slots() -> usize {
    32
}

fn default_label_max() -> usize {
    31
}

fn default_description_max() -> usize {
    63
}

fn default_link_max() -> usize {
    31
}

fn default_root_link() -> String {
    "_REGISTRY_".into()
}

impl Default for SnapSettings {
    fn default() -> Self {
        SnapSettings {
            chunk_slots: default_chunk_slots(),
            label_max: default_label_max(),
            description_max: default_description_max(),
            link_max: default_link_max(),
            pretty_json: false,
            root_link: default_root_link(),
        }
    }
}

impl SnapSettings {
    /// Parse settings from YAML text. Missing fields take their defaults.
    pub fn from_yaml(input: &str) -> Result<SnapSettings> {
        if input.trim().is_empty() {
            return Ok(SnapSettings::default());
        }
        Ok(serde_yaml::from_str(input)?)
    }

    /// Load settings from a file. A missing file yields the defaults.
    pub fn from_file(path: &Path) -> Result<SnapSettings> {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::from_yaml(&content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(SnapSettings::default()),
            Err(e) => Err(SnapError::io(path, e)),
        }
    }

    /// Load from `$OBJSNAP_CONFIG`, falling back to
    /// `~/.config/objsnap/config.yaml`.
    pub fn from_default_path() -> Result<SnapSettings> {
        match default_path() {
            Some(path) => Self::from_file(&path),
            None => Ok(SnapSettings::default()),
        }
    }
}

fn default_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("OBJSNAP_CONFIG") {
        return Some(PathBuf::from(path));
    }
    std::env::var("HOME")
        .ok()
        .map(|home| PathBuf::from(home).join(".config/objsnap/config.yaml"))
}
