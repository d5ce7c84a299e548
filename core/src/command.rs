//! Command — the typed interface for all objsnap operations.
//!
//! Snapshots live in a `Sys` under names; every command addresses them by
//! name. The CLI translates its arguments into a sequence of these.

use serde::{Deserialize, Serialize};

use crate::data::OutputFormat;


#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "command")]
pub enum Command {
    // -----------------------------------------------------------------
    // Snapshot sources
    // -----------------------------------------------------------------

    #[serde(rename = "snapshot.capture")]
    Capture {
        heap: String,
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        root: Option<u64>,
    },

    #[serde(rename = "snapshot.load")]
    Load {
        path: String,
        name: String,
    },

    #[serde(rename = "snapshot.copy")]
    Copy {
        from: String,
        to: String,
    },

    // -----------------------------------------------------------------
    // Output
    // -----------------------------------------------------------------

    #[serde(rename = "snapshot.save")]
    Save {
        name: String,
        path: String,
        #[serde(default)]
        format: OutputFormat,
    },

    #[serde(rename = "snapshot.print")]
    Print {
        name: String,
        #[serde(default)]
        format: OutputFormat,
    },

    // -----------------------------------------------------------------
    // Analysis
    // -----------------------------------------------------------------

    #[serde(rename = "snapshot.diff")]
    Diff {
        base: String,
        target: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        added: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        removed: Option<String>,
    },

    #[serde(rename = "snapshot.count")]
    Count {
        name: String,
    },

    #[serde(rename = "snapshot.stat")]
    Stat {
        name: String,
    },

    // -----------------------------------------------------------------
    // Bookkeeping / Help
    // -----------------------------------------------------------------

    #[serde(rename = "snapshot.free")]
    Free {
        name: String,
    },

    #[serde(rename = "snapshot.list")]
    List,

    #[serde(rename = "help")]
    Help {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        topic: Option<String>,
    },
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_round_trip() {
        let cmd = Command::Capture {
            heap: "heap.yaml".into(),
            name: "before".into(),
            root: Some(7),
        };
        let json = serde_json::to_string(&cmd).unwrap();
        assert!(json.contains("\"command\":\"snapshot.capture\""));
        let back: Command = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cmd);
    }

    #[test]
    fn list_round_trip() {
        let cmd = Command::List;
        let json = serde_json::to_string(&cmd).unwrap();
        assert!(json.contains("\"command\":\"snapshot.list\""));
        let back: Command = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cmd);
    }

    #[test]
    fn save_round_trip() {
        let cmd = Command::Save {
            name: "after".into(),
            path: "/tmp/after.txt".into(),
            format: OutputFormat::Report,
        };
        let json = serde_json::to_string(&cmd).unwrap();
        assert!(json.contains("\"command\":\"snapshot.save\""));
        assert!(json.contains("\"format\":\"report\""));
        let back: Command = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cmd);
    }

    #[test]
    fn print_format_defaults_to_json() {
        let back: Command =
            serde_json::from_str(r#"{"command":"snapshot.print","name":"a"}"#).unwrap();
        assert_eq!(
            back,
            Command::Print {
                name: "a".into(),
                format: OutputFormat::Json,
            }
        );
    }

    #[test]
    fn diff_round_trip() {
        let cmd = Command::Diff {
            base: "before".into(),
            target: "after".into(),
            added: Some("grown".into()),
            removed: None,
        };
        let json = serde_json::to_string(&cmd).unwrap();
        assert!(json.contains("\"command\":\"snapshot.diff\""));
        assert!(!json.contains("removed"));
        let back: Command = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cmd);
    }

    #[test]
    fn help_round_trip() {
        let cmd = Command::Help { topic: Some("diff".into()) };
        let json = serde_json::to_string(&cmd).unwrap();
        assert!(json.contains("\"command\":\"help\""));
        let back: Command = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cmd);
    }
}
