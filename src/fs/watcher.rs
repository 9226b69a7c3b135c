use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use log::debug;
use notify::event::ModifyKind;
use notify::{recommended_watcher, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

/// Change notification kinds consumed by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsEventKind {
    Created,
    Deleted,
    Renamed,
    Changed,
}

/// One filesystem change inside the watched subtree.
#[derive(Debug, Clone)]
pub struct FsEvent {
    pub kind: FsEventKind,
    pub path: PathBuf,
}

/// Shared set of names present in the last-known tree, refreshed by the
/// engine after every rebuild and read by the strict event filter.
pub type KnownNames = Arc<RwLock<HashSet<String>>>;

/// Watches a root directory recursively and invokes a callback per mapped
/// event. Dropping the watcher stops it.
pub struct TreeWatcher {
    _watcher: RecommendedWatcher,
}

impl TreeWatcher {
    /// Watch `root` and deliver events to `on_event` (called on the notify
    /// backend thread, so it must stay cheap — in the shipped binary it
    /// just pulls the debounce trigger).
    ///
    /// With `strict` set, `Changed`/`Deleted` events for names absent from
    /// the last-known tree are dropped, avoiding rebuild churn from
    /// transient temp files.
    pub fn new<F>(root: &Path, strict: bool, known: KnownNames, on_event: F) -> notify::Result<Self>
    where
        F: Fn(&FsEvent) + Send + 'static,
    {
        let mut watcher = recommended_watcher(move |result: notify::Result<notify::Event>| {
            let event = match result {
                Ok(event) => event,
                Err(e) => {
                    debug!("watcher error: {e}");
                    return;
                }
            };
            let Some(kind) = map_event_kind(&event.kind) else {
                return;
            };
            for path in event.paths {
                let forward = {
                    let known = known.read().unwrap_or_else(|e| e.into_inner());
                    let name = path.file_name().and_then(|n| n.to_str());
                    should_forward(kind, name, strict, &known)
                };
                if forward {
                    on_event(&FsEvent { kind, path });
                }
            }
        })?;

        watcher.watch(root, RecursiveMode::Recursive)?;
        Ok(Self { _watcher: watcher })
    }
}

/// Map a raw notify event to the engine's event kinds. Access events carry
/// no tree-shape information and are dropped.
fn map_event_kind(kind: &EventKind) -> Option<FsEventKind> {
    match kind {
        EventKind::Create(_) => Some(FsEventKind::Created),
        EventKind::Remove(_) => Some(FsEventKind::Deleted),
        EventKind::Modify(ModifyKind::Name(_)) => Some(FsEventKind::Renamed),
        EventKind::Modify(_) | EventKind::Any => Some(FsEventKind::Changed),
        EventKind::Access(_) | EventKind::Other => None,
    }
}

/// Strict-mode decision: `Changed`/`Deleted` events only count when the
/// affected name is (still) part of the last-known tree.
fn should_forward(
    kind: FsEventKind,
    name: Option<&str>,
    strict: bool,
    known: &HashSet<String>,
) -> bool {
    if !strict {
        return true;
    }
    match kind {
        FsEventKind::Changed | FsEventKind::Deleted => name.is_some_and(|n| known.contains(n)),
        FsEventKind::Created | FsEventKind::Renamed => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, CreateKind, DataChange, ModifyKind, RemoveKind, RenameMode};

    #[test]
    fn create_and_remove_map_directly() {
        assert_eq!(
            map_event_kind(&EventKind::Create(CreateKind::File)),
            Some(FsEventKind::Created)
        );
        assert_eq!(
            map_event_kind(&EventKind::Remove(RemoveKind::Any)),
            Some(FsEventKind::Deleted)
        );
    }

    #[test]
    fn name_modifications_are_renames() {
        assert_eq!(
            map_event_kind(&EventKind::Modify(ModifyKind::Name(RenameMode::Any))),
            Some(FsEventKind::Renamed)
        );
    }

    #[test]
    fn data_modifications_are_changes() {
        assert_eq!(
            map_event_kind(&EventKind::Modify(ModifyKind::Data(DataChange::Any))),
            Some(FsEventKind::Changed)
        );
    }

    #[test]
    fn access_events_are_dropped() {
        assert_eq!(map_event_kind(&EventKind::Access(AccessKind::Any)), None);
    }

    fn known(names: &[&str]) -> HashSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn non_strict_forwards_everything() {
        let empty = known(&[]);
        for kind in [
            FsEventKind::Created,
            FsEventKind::Deleted,
            FsEventKind::Renamed,
            FsEventKind::Changed,
        ] {
            assert!(should_forward(kind, Some("anything"), false, &empty));
        }
    }

    #[test]
    fn strict_drops_changes_to_unknown_names() {
        let names = known(&["main.rs"]);
        assert!(!should_forward(
            FsEventKind::Changed,
            Some("scratch.tmp"),
            true,
            &names
        ));
        assert!(!should_forward(
            FsEventKind::Deleted,
            Some("scratch.tmp"),
            true,
            &names
        ));
    }

    #[test]
    fn strict_keeps_changes_to_known_names() {
        let names = known(&["main.rs"]);
        assert!(should_forward(
            FsEventKind::Changed,
            Some("main.rs"),
            true,
            &names
        ));
        assert!(should_forward(
            FsEventKind::Deleted,
            Some("main.rs"),
            true,
            &names
        ));
    }

    #[test]
    fn strict_always_keeps_creates_and_renames() {
        let empty = known(&[]);
        assert!(should_forward(
            FsEventKind::Created,
            Some("new.rs"),
            true,
            &empty
        ));
        assert!(should_forward(
            FsEventKind::Renamed,
            Some("moved.rs"),
            true,
            &empty
        ));
    }

    #[test]
    fn strict_drops_nameless_change_events() {
        let names = known(&["main.rs"]);
        assert!(!should_forward(FsEventKind::Changed, None, true, &names));
    }
}
