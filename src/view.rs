use std::collections::HashSet;

use crate::fs::snapshot::{NodeId, Snapshot};

/// Path-keyed projection of the UI-relevant flags of one snapshot.
///
/// Captured from snapshot N and applied to snapshot N+1; node identity
/// across rebuilds is path equality, nothing else.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewState {
    pub expanded: HashSet<String>,
    pub selected: Option<String>,
}

/// Per-snapshot expand/select flags, indexed by arena slot.
///
/// Lives and dies with its snapshot; a rebuild derives a fresh set via
/// [`capture`] + [`apply`].
#[derive(Debug, Clone)]
pub struct ViewFlags {
    expanded: Vec<bool>,
    selected: Option<NodeId>,
}

impl ViewFlags {
    pub fn new(snapshot: &Snapshot) -> Self {
        Self {
            expanded: vec![false; snapshot.len()],
            selected: None,
        }
    }

    pub fn is_expanded(&self, id: NodeId) -> bool {
        self.expanded.get(id).copied().unwrap_or(false)
    }

    pub fn set_expanded(&mut self, id: NodeId, expanded: bool) {
        if let Some(flag) = self.expanded.get_mut(id) {
            *flag = expanded;
        }
    }

    pub fn selected(&self) -> Option<NodeId> {
        self.selected
    }

    pub fn select(&mut self, id: Option<NodeId>) {
        self.selected = id;
    }
}

/// Walk the whole tree once and record every expanded path plus the
/// selected path, if any.
pub fn capture(snapshot: &Snapshot, flags: &ViewFlags) -> ViewState {
    let mut expanded = HashSet::new();
    for id in snapshot.ids() {
        if flags.is_expanded(id) {
            expanded.insert(snapshot.path(id));
        }
    }
    ViewState {
        expanded,
        selected: flags.selected().map(|id| snapshot.path(id)),
    }
}

/// Walk a (possibly structurally different) tree once and re-mark the nodes
/// whose derived paths appear in `state`. Paths that no longer exist are
/// silently dropped; in particular a deleted selection leaves the new flags
/// with no selection.
pub fn apply(snapshot: &Snapshot, state: &ViewState) -> ViewFlags {
    let mut flags = ViewFlags::new(snapshot);
    for id in snapshot.ids() {
        let path = snapshot.path(id);
        if state.expanded.contains(&path) {
            flags.set_expanded(id, true);
        }
        if state.selected.as_deref() == Some(path.as_str()) {
            flags.select(Some(id));
        }
    }
    flags
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use tempfile::TempDir;

    use crate::fs::builder::build;

    fn setup_tree() -> (TempDir, Snapshot) {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("alpha")).unwrap();
        File::create(dir.path().join("alpha").join("inner.txt")).unwrap();
        File::create(dir.path().join("outer.txt")).unwrap();
        let snap = build(dir.path());
        (dir, snap)
    }

    #[test]
    fn capture_collects_expanded_paths_and_selection() {
        let (_dir, snap) = setup_tree();
        let alpha = snap.find_by_path("alpha").unwrap();
        let outer = snap.find_by_path("outer.txt").unwrap();

        let mut flags = ViewFlags::new(&snap);
        flags.set_expanded(snap.root(), true);
        flags.set_expanded(alpha, true);
        flags.select(Some(outer));

        let state = capture(&snap, &flags);
        assert!(state.expanded.contains("alpha"));
        assert_eq!(state.selected.as_deref(), Some("outer.txt"));
    }

    #[test]
    fn state_round_trips_across_a_rebuild() {
        let (dir, snap1) = setup_tree();
        let alpha = snap1.find_by_path("alpha").unwrap();
        let mut flags = ViewFlags::new(&snap1);
        flags.set_expanded(alpha, true);
        flags.select(snap1.find_by_path("outer.txt"));
        let state = capture(&snap1, &flags);

        // Something changes on disk, then a full rebuild.
        File::create(dir.path().join("new.txt")).unwrap();
        let snap2 = build(dir.path());

        let restored = apply(&snap2, &state);
        let alpha2 = snap2.find_by_path("alpha").unwrap();
        assert!(restored.is_expanded(alpha2));
        assert_eq!(restored.selected(), snap2.find_by_path("outer.txt"));
    }

    #[test]
    fn deleted_selection_restores_to_none() {
        let (dir, snap1) = setup_tree();
        let mut flags = ViewFlags::new(&snap1);
        flags.select(snap1.find_by_path("outer.txt"));
        let state = capture(&snap1, &flags);

        fs::remove_file(dir.path().join("outer.txt")).unwrap();
        let snap2 = build(dir.path());

        let restored = apply(&snap2, &state);
        assert_eq!(restored.selected(), None);
    }

    #[test]
    fn unknown_expanded_paths_are_dropped() {
        let (_dir, snap) = setup_tree();
        let mut state = ViewState::default();
        state.expanded.insert("no/such/dir".to_string());

        let restored = apply(&snap, &state);
        assert!(snap.ids().all(|id| !restored.is_expanded(id)));
    }

    #[test]
    fn empty_state_marks_nothing() {
        let (_dir, snap) = setup_tree();
        let restored = apply(&snap, &ViewState::default());
        assert_eq!(restored.selected(), None);
        assert!(snap.ids().all(|id| !restored.is_expanded(id)));
    }
}
