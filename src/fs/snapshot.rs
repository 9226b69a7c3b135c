use std::collections::HashSet;
use std::path::{PathBuf, MAIN_SEPARATOR_STR};

/// Index of a node in a [`Snapshot`] arena.
pub type NodeId = usize;

/// Kind of tree node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Directory,
    File,
    /// Sentinel standing in for a directory below the depth limit.
    Truncated,
    /// Directory that could not be read due to permissions.
    AccessDenied,
}

/// A node in the snapshot arena.
///
/// The node's path is derived, never stored: ancestor names below the root
/// joined by the platform separator.
#[derive(Debug, Clone)]
pub struct Node {
    pub name: String,
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

/// One immutable build of the directory tree.
///
/// Nodes are stored in pre-order, so arena index order *is* document order:
/// "next node" is `id + 1` and a wraparound restarts at the first child of
/// the root. A rebuild produces a whole new `Snapshot`; nothing is mutated
/// in place, so readers holding an `Arc` of an old snapshot stay valid.
#[derive(Debug)]
pub struct Snapshot {
    root_path: PathBuf,
    nodes: Vec<Node>,
}

impl Snapshot {
    /// Assemble a snapshot from builder output. `nodes[0]` must be the root.
    pub fn new(root_path: PathBuf, nodes: Vec<Node>) -> Self {
        debug_assert!(!nodes.is_empty(), "snapshot requires a root node");
        Self { root_path, nodes }
    }

    /// A snapshot containing only the root directory, used before the
    /// first rebuild has run.
    pub fn root_only(root_path: PathBuf) -> Self {
        let name = root_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| root_path.to_string_lossy().to_string());
        Self {
            root_path,
            nodes: vec![Node {
                name,
                kind: NodeKind::Directory,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    /// The arena slot of the root directory.
    pub fn root(&self) -> NodeId {
        0
    }

    /// Absolute path of the watched root directory.
    #[allow(dead_code)]
    pub fn root_path(&self) -> &PathBuf {
        &self.root_path
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    /// All node ids in document (pre-order) order.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> {
        0..self.nodes.len()
    }

    /// Derived path of a node: ancestor names below the root, joined by the
    /// platform separator. The root's own path is empty — the tree's
    /// visible entries are the root directory's children.
    pub fn path(&self, id: NodeId) -> String {
        let mut segments = Vec::new();
        let mut current = id;
        while let Some(parent) = self.nodes[current].parent {
            segments.push(self.nodes[current].name.as_str());
            current = parent;
        }
        segments.reverse();
        segments.join(MAIN_SEPARATOR_STR)
    }

    /// Absolute on-disk path of a node.
    pub fn absolute_path(&self, id: NodeId) -> PathBuf {
        let mut segments = Vec::new();
        let mut current = id;
        while let Some(parent) = self.nodes[current].parent {
            segments.push(self.nodes[current].name.as_str());
            current = parent;
        }
        let mut path = self.root_path.clone();
        for segment in segments.into_iter().rev() {
            path.push(segment);
        }
        path
    }

    /// Look a node up by its derived path. Path equality is the only node
    /// identity that survives a rebuild.
    pub fn find_by_path(&self, path: &str) -> Option<NodeId> {
        if path.is_empty() {
            return None;
        }
        self.ids().skip(1).find(|&id| self.path(id) == path)
    }

    /// Names of every node in the tree, for the watcher's strict filter.
    pub fn names(&self) -> HashSet<String> {
        self.nodes.iter().map(|n| n.name.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::MAIN_SEPARATOR;

    /// root ── alpha ── inner.txt
    ///      └─ file.rs
    fn sample() -> Snapshot {
        Snapshot::new(
            PathBuf::from("/tmp/root"),
            vec![
                Node {
                    name: "root".into(),
                    kind: NodeKind::Directory,
                    parent: None,
                    children: vec![1, 3],
                },
                Node {
                    name: "alpha".into(),
                    kind: NodeKind::Directory,
                    parent: Some(0),
                    children: vec![2],
                },
                Node {
                    name: "inner.txt".into(),
                    kind: NodeKind::File,
                    parent: Some(1),
                    children: vec![],
                },
                Node {
                    name: "file.rs".into(),
                    kind: NodeKind::File,
                    parent: Some(0),
                    children: vec![],
                },
            ],
        )
    }

    #[test]
    fn root_path_is_empty() {
        let snap = sample();
        assert_eq!(snap.path(snap.root()), "");
    }

    #[test]
    fn path_joins_segments_below_root() {
        let snap = sample();
        assert_eq!(snap.path(1), "alpha");
        assert_eq!(snap.path(2), format!("alpha{}inner.txt", MAIN_SEPARATOR));
        assert_eq!(snap.path(3), "file.rs");
    }

    #[test]
    fn absolute_path_includes_root() {
        let snap = sample();
        assert_eq!(
            snap.absolute_path(2),
            PathBuf::from("/tmp/root").join("alpha").join("inner.txt")
        );
    }

    #[test]
    fn find_by_path_round_trips() {
        let snap = sample();
        for id in snap.ids().skip(1) {
            assert_eq!(snap.find_by_path(&snap.path(id)), Some(id));
        }
    }

    #[test]
    fn find_by_path_missing_and_empty() {
        let snap = sample();
        assert_eq!(snap.find_by_path("nope.txt"), None);
        assert_eq!(snap.find_by_path(""), None);
    }

    #[test]
    fn root_only_has_single_directory_node() {
        let snap = Snapshot::root_only(PathBuf::from("/tmp/project"));
        assert_eq!(snap.len(), 1);
        assert_eq!(snap.node(0).name, "project");
        assert_eq!(snap.node(0).kind, NodeKind::Directory);
    }

    #[test]
    fn names_cover_all_nodes() {
        let snap = sample();
        let names = snap.names();
        assert!(names.contains("alpha"));
        assert!(names.contains("inner.txt"));
        assert!(names.contains("file.rs"));
    }
}
