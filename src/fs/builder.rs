use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::Path;

use log::debug;

use crate::fs::snapshot::{Node, NodeId, NodeKind, Snapshot};

/// How far down the tree the walk goes before stopping.
pub const MAXIMUM_DEPTH: usize = 5;

/// Directories excluded from recursion, by exact case-sensitive name.
// TODO: match against `.gitignore` files
pub const EXCLUDED_DIRS: &[&str] = &["node_modules", ".git", ".idea", ".tscache"];

/// Display name of the sentinel emitted below the depth limit.
pub const TRUNCATED_LABEL: &str = "…";

/// Walk `root` and produce a fresh snapshot.
///
/// The build never fails as a whole: directories that vanish mid-walk come
/// back empty and unreadable directories are marked [`NodeKind::AccessDenied`].
pub fn build(root: &Path) -> Snapshot {
    let name = root
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| root.to_string_lossy().to_string());

    let mut nodes = Vec::new();
    build_directory(&mut nodes, root, name, None, 0);
    Snapshot::new(root.to_path_buf(), nodes)
}

/// One directory's listing, or why it could not be produced.
enum Listing {
    /// `(name, is_dir)` pairs, unfiltered and unsorted.
    Entries(Vec<(String, bool)>),
    /// Raced with a concurrent delete; treat as empty.
    Vanished,
    /// Permission failure; surfaced on the node itself.
    Denied,
}

fn list_directory(path: &Path) -> Listing {
    let entries = match fs::read_dir(path) {
        Ok(entries) => entries,
        Err(e) => return classify_read_dir_error(e.kind()),
    };

    let mut listing = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(e) => e,
            Err(_) => continue,
        };
        let is_dir = match entry.file_type() {
            Ok(ft) => ft.is_dir(),
            Err(_) => continue,
        };
        listing.push((entry.file_name().to_string_lossy().to_string(), is_dir));
    }
    Listing::Entries(listing)
}

fn classify_read_dir_error(kind: io::ErrorKind) -> Listing {
    match kind {
        io::ErrorKind::PermissionDenied => Listing::Denied,
        // Anything else is treated like a directory deleted under us.
        _ => Listing::Vanished,
    }
}

/// Recursively build the arena node for one directory. Returns its id.
///
/// Nodes are pushed parent-first, so the finished arena is in pre-order.
fn build_directory(
    nodes: &mut Vec<Node>,
    path: &Path,
    name: String,
    parent: Option<NodeId>,
    depth: usize,
) -> NodeId {
    if depth > MAXIMUM_DEPTH {
        let id = nodes.len();
        nodes.push(Node {
            name: TRUNCATED_LABEL.to_string(),
            kind: NodeKind::Truncated,
            parent,
            children: Vec::new(),
        });
        return id;
    }

    let id = nodes.len();
    nodes.push(Node {
        name,
        kind: NodeKind::Directory,
        parent,
        children: Vec::new(),
    });

    let entries = match list_directory(path) {
        Listing::Entries(entries) => entries,
        Listing::Vanished => {
            debug!("directory vanished during walk: {}", path.display());
            return id;
        }
        Listing::Denied => {
            debug!("access denied: {}", path.display());
            nodes[id].kind = NodeKind::AccessDenied;
            return id;
        }
    };

    let mut children: Vec<(String, bool)> = Vec::new();
    let mut file_names: Vec<String> = Vec::new();
    for (entry_name, is_dir) in entries {
        if is_dir {
            if !EXCLUDED_DIRS.contains(&entry_name.as_str()) {
                children.push((entry_name, true));
            }
        } else {
            file_names.push(entry_name);
        }
    }
    for file in stack_filter(&file_names) {
        children.push((file, false));
    }

    // (extension, then full name), independent of kind, so an original and
    // its generated variants sort adjacently.
    children.sort_by(|a, b| {
        extension_of(&a.0)
            .cmp(extension_of(&b.0))
            .then_with(|| a.0.cmp(&b.0))
    });

    let mut child_ids = Vec::with_capacity(children.len());
    for (child_name, is_dir) in children {
        if is_dir {
            let child_path = path.join(&child_name);
            child_ids.push(build_directory(nodes, &child_path, child_name, Some(id), depth + 1));
        } else {
            let child_id = nodes.len();
            nodes.push(Node {
                name: child_name,
                kind: NodeKind::File,
                parent: Some(id),
                children: Vec::new(),
            });
            child_ids.push(child_id);
        }
    }
    nodes[id].children = child_ids;
    id
}

/// Filter out generated files. Currently only supports ts -> js -> js.map.
///
/// A file is suppressed only when its canonical source is present in the
/// same (unfiltered) listing, so the pass is idempotent and each file gets
/// at most one suppression check.
pub fn stack_filter(files: &[String]) -> Vec<String> {
    let all: HashSet<&str> = files.iter().map(String::as_str).collect();
    let mut output = Vec::new();
    for file in files {
        let suppressed = if let Some(base) = file.strip_suffix(".js.map") {
            all.contains(format!("{base}.js").as_str())
        } else if let Some(base) = file.strip_suffix(".js") {
            all.contains(format!("{base}.ts").as_str())
        } else if let Some(base) = file.strip_suffix(".d.ts") {
            all.contains(format!("{base}.ts").as_str())
        } else {
            false
        };
        if !suppressed {
            output.push(file.clone());
        }
    }
    output
}

/// Extension sort key: the segment after the last interior dot.
/// Dotless names and dotfiles ("Makefile", ".env") key as empty.
fn extension_of(name: &str) -> &str {
    match name.rfind('.') {
        Some(i) if i > 0 => &name[i + 1..],
        _ => "",
    }
}
