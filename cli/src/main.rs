//! objsnap CLI — the command-line entry point.
//!
//! Each invocation becomes a short sequence of `Command`s executed by one
//! local `Sys`: load or capture into named slots, then print or save.

use std::process;

use objsnap_core::command::Command;
use objsnap_core::data::OutputFormat;
use objsnap_core::response::Response;
use objsnap_core::sys::Sys;
use objsnap_core::types::config::SnapSettings;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};


fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args: Vec<String> = std::env::args().collect();
    let arg_refs: Vec<&str> = args[1..].iter().map(|s| s.as_str()).collect();

    let cmds = match parse_args(&arg_refs) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("objsnap: {}", e);
            process::exit(1);
        }
    };

    let settings = match SnapSettings::from_default_path() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("objsnap: {}", e);
            process::exit(1);
        }
    };

    let mut sys = Sys::new(settings);
    for cmd in cmds {
        let shows_output = prints_result(&cmd);
        match sys.execute(cmd) {
            Response::Ok { output } => {
                if shows_output {
                    if !output.is_empty() {
                        println!("{}", output);
                    }
                } else {
                    info!("{}", output);
                }
            }
            Response::Error { message } => {
                eprintln!("objsnap error: {}", message);
                process::exit(1);
            }
        }
    }
}


/// Commands whose output is the answer the user asked for, as opposed to a
/// progress note.
fn prints_result(cmd: &Command) -> bool {
    matches!(
        cmd,
        Command::Print { .. }
            | Command::Count { .. }
            | Command::Stat { .. }
            | Command::List
            | Command::Help { .. }
    )
}


fn parse_args(args: &[&str]) -> Result<Vec<Command>, String> {
    if args.is_empty() {
        return Err("No command specified. Run 'objsnap help' for usage.".into());
    }

    match args[0] {
        "capture" => parse_capture(args),
        "print" => {
            if args.len() < 2 {
                return Err("Usage: objsnap print <snap.json> [--format <fmt>]".into());
            }
            Ok(vec![
                load(args[1], "snap"),
                Command::Print {
                    name: "snap".into(),
                    format: parse_format(args)?,
                },
            ])
        }
        "diff" => parse_diff(args),
        "count" => {
            if args.len() < 2 {
                return Err("Usage: objsnap count <snap.json>".into());
            }
            Ok(vec![load(args[1], "snap"), Command::Count { name: "snap".into() }])
        }
        "stat" => {
            if args.len() < 2 {
                return Err("Usage: objsnap stat <snap.json>".into());
            }
            Ok(vec![load(args[1], "snap"), Command::Stat { name: "snap".into() }])
        }
        "run" => {
            if args.len() < 2 {
                return Err("Usage: objsnap run <commands.json>".into());
            }
            read_script(args[1])
        }
        "help" => Ok(vec![Command::Help {
            topic: args.get(1).map(|s| s.to_string()),
        }]),
        _ => Err(format!("Unknown command: '{}'. Run 'objsnap help' for usage.", args[0])),
    }
}


fn parse_capture(args: &[&str]) -> Result<Vec<Command>, String> {
    if args.len() < 2 || args[1].starts_with('-') {
        return Err(
            "Usage: objsnap capture <heap.yaml> [--root <id>] [-o <out>] [--format <fmt>]".into(),
        );
    }
    let root = match find_flag(args, "--root") {
        Some(id) => Some(parse_id(&id)?),
        None => None,
    };
    let name = "capture".to_string();
    let mut cmds = vec![Command::Capture {
        heap: args[1].into(),
        name: name.clone(),
        root,
    }];
    cmds.push(emit(name, find_flag(args, "-o"), parse_format(args)?));
    Ok(cmds)
}


fn parse_diff(args: &[&str]) -> Result<Vec<Command>, String> {
    if args.len() < 3 {
        return Err("Usage: objsnap diff <base.json> <target.json> [--added <out>] [--removed <out>] [--format <fmt>]".into());
    }
    let format = parse_format(args)?;
    let added_out = find_flag(args, "--added");
    let removed_out = find_flag(args, "--removed");
    let both = added_out.is_none() && removed_out.is_none();

    let mut cmds = vec![
        load(args[1], "base"),
        load(args[2], "target"),
        Command::Diff {
            base: "base".into(),
            target: "target".into(),
            added: (both || added_out.is_some()).then(|| "added".to_string()),
            removed: (both || removed_out.is_some()).then(|| "removed".to_string()),
        },
    ];
    if both || added_out.is_some() {
        cmds.push(emit("added".into(), added_out, format));
    }
    if both || removed_out.is_some() {
        cmds.push(emit("removed".into(), removed_out, format));
    }
    Ok(cmds)
}


fn load(path: &str, name: &str) -> Command {
    Command::Load {
        path: path.into(),
        name: name.into(),
    }
}


/// Save to `out` when given, otherwise print.
fn emit(name: String, out: Option<String>, format: OutputFormat) -> Command {
    match out {
        Some(path) => Command::Save { name, path, format },
        None => Command::Print { name, format },
    }
}


fn parse_format(args: &[&str]) -> Result<OutputFormat, String> {
    match find_flag(args, "--format") {
        Some(f) => f.parse(),
        None => Ok(OutputFormat::default()),
    }
}


/// Object ids are accepted in decimal or `0x` hex.
fn parse_id(text: &str) -> Result<u64, String> {
    let parsed = match text.strip_prefix("0x") {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => text.parse(),
    };
    parsed.map_err(|_| format!("Invalid object id: '{}'", text))
}


/// A JSON array of commands, e.g. `[{"command":"snapshot.list"}]`.
fn read_script(path: &str) -> Result<Vec<Command>, String> {
    let raw = std::fs::read(path).map_err(|e| format!("Failed to read '{}': {}", path, e))?;
    serde_json::from_slice(&raw).map_err(|e| format!("Failed to parse command JSON: {}", e))
}


fn find_flag(args: &[&str], flag: &str) -> Option<String> {
    for (i, arg) in args.iter().enumerate() {
        if *arg == flag {
            return args.get(i + 1).map(|s| s.to_string());
        }
    }
    None
}
