//! Help system for objsnap commands.

pub fn help_text(topic: Option<&str>) -> String {
    match topic {
        None => overview(),
        Some(t) => {
            if let Some(text) = command_help(t) {
                return text;
            }
            if let Some(text) = group_help(t) {
                return text;
            }
            format!("Unknown help topic: '{}'. Run 'objsnap help' for a list of commands.", t)
        }
    }
}


fn overview() -> String {
    "\
objsnap — object-graph snapshots and diffs

Usage: objsnap <command> [args...]

Commands:
  capture <heap.yaml> [--root <id>] [-o <out>] [--format <fmt>]
                             Capture a snapshot from a heap description
  print <snap.json> [--format <fmt>]
                             Print a saved snapshot
  diff <base.json> <target.json> [--added <out>] [--removed <out>] [--format <fmt>]
                             Compare two saved snapshots
  count <snap.json>          Count nodes in a snapshot
  stat <snap.json>           Node, depth, and kind statistics as JSON
  run <commands.json>        Execute a JSON array of tagged commands
  help [topic]               Show help

Formats:
  json                       Compact JSON tree (default)
  jsonfmt                    Indented JSON tree
  report                     Tab-separated table with full link paths

Topics: formats, heap, config

Run 'objsnap help <command>' for detailed help on a specific command."
        .into()
}


fn group_help(group: &str) -> Option<String> {
    let text = match group {
        "formats" => "\
Output formats

  json
    {name, type, refs, desc, link, childs} per node, children nested.
    Diff output also carries mark: \"+\" (added) or \"-\" (removed).

  jsonfmt
    Same document, indented.

  report
    One row per node: name, refs, desc, full link path (links joined
    with '.'). Diff reports list leaves plus marked nodes only.",

        "heap" => "\
Heap descriptions — the YAML input to 'capture'

  root: <id>
  objects:
    - id: <id>
      kind: string | table | function | userdata | thread
      size: <n>            (tables; default = number of refs)
      source: <file:line>  (functions)
      desc: <text>         (overrides the derived description)
      refs:
        - { link: <name>, to: <id>, weak: <bool> }

  Objects are walked depth-first from the root. Each object is captured
  once; later references only raise its refcount. Weak refs are skipped.",

        "config" => "\
Configuration — YAML at $OBJSNAP_CONFIG or ~/.config/objsnap/config.yaml

  chunk_slots       arena chunk size (default 32)
  label_max         label length limit (default 31)
  description_max   description length limit (default 63)
  link_max          link length limit (default 31)
  pretty_json       default to indented JSON (default false)
  root_link         link given to the captured root (default _REGISTRY_)

Logging follows RUST_LOG (default: warn).",

        _ => return None,
    };
    Some(text.into())
}


fn command_help(command: &str) -> Option<String> {
    let text = match command {
        "capture" => "objsnap capture — capture a heap description\n\nUsage: objsnap capture <heap.yaml> [--root <id>] [-o <out>] [--format <fmt>]\n\nWithout -o the snapshot is printed to stdout.",
        "print" => "objsnap print — print a saved snapshot\n\nUsage: objsnap print <snap.json> [--format <fmt>]",
        "diff" => "objsnap diff — compare two saved snapshots\n\nUsage: objsnap diff <base.json> <target.json> [--added <out>] [--removed <out>] [--format <fmt>]\n\nAdded nodes get a \"(+)\" description suffix, removed nodes \"(-)\". A table\nwhose recorded size grew is reported with \"(+<delta>)\". Without --added/--removed both sides print.",
        "count" => "objsnap count — count snapshot nodes\n\nUsage: objsnap count <snap.json>",
        "stat" => "objsnap stat — snapshot statistics\n\nUsage: objsnap stat <snap.json>",
        "run" => "objsnap run — execute a command script\n\nUsage: objsnap run <commands.json>\n\nThe file holds a JSON array such as\n[{\"command\":\"snapshot.load\",\"path\":\"a.json\",\"name\":\"a\"},{\"command\":\"snapshot.count\",\"name\":\"a\"}]",
        "help" => "objsnap help — show help\n\nUsage: objsnap help [topic]",
        _ => return None,
    };
    Some(text.into())
}
