use std::path::PathBuf;
use std::sync::Arc;

use log::{debug, warn};
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use crate::error::{AppError, Result};
use crate::fs::builder;
use crate::fs::snapshot::Snapshot;
use crate::fs::watcher::KnownNames;
use crate::search::engine::find_next;
use crate::search::{MatchPredicate, SearchMode, SearchOutcome};
use crate::view::{self, ViewFlags, ViewState};

/// Commands accepted by the engine task.
enum Command {
    Rebuild {
        done: Option<oneshot::Sender<()>>,
    },
    CurrentTree {
        reply: oneshot::Sender<Arc<Snapshot>>,
    },
    Search {
        pattern: String,
        mode: SearchMode,
        reply: oneshot::Sender<Result<SearchOutcome>>,
    },
    CaptureState {
        reply: oneshot::Sender<ViewState>,
    },
    ApplyState {
        state: ViewState,
    },
    SetExpanded {
        path: String,
        expanded: bool,
    },
    Selected {
        reply: oneshot::Sender<Option<String>>,
    },
    /// Internal: a search task finished.
    SearchDone {
        seq: u64,
        outcome: SearchOutcome,
    },
}

/// Cloneable handle to the engine task — the collaborator surface.
#[derive(Clone)]
pub struct EngineHandle {
    tx: mpsc::UnboundedSender<Command>,
}

impl EngineHandle {
    fn send(&self, cmd: Command) -> Result<()> {
        self.tx
            .send(cmd)
            .map_err(|_| AppError::Engine("engine task stopped".into()))
    }

    /// Queue a rebuild without waiting for it; this is the debounce action.
    pub fn request_rebuild(&self) -> Result<()> {
        self.send(Command::Rebuild { done: None })
    }

    /// Rebuild and wait until the new snapshot is swapped in.
    #[allow(dead_code)]
    pub async fn rebuild(&self) -> Result<()> {
        let (done, rx) = oneshot::channel();
        self.send(Command::Rebuild { done: Some(done) })?;
        rx.await
            .map_err(|_| AppError::Engine("engine task stopped".into()))
    }

    /// The current snapshot, for rendering.
    #[allow(dead_code)]
    pub async fn current_tree(&self) -> Result<Arc<Snapshot>> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::CurrentTree { reply })?;
        rx.await
            .map_err(|_| AppError::Engine("engine task stopped".into()))
    }

    /// Run a search from the current selection. A new call supersedes any
    /// search still in flight. `Found` results move the selection; other
    /// outcomes leave it untouched.
    pub async fn search(&self, pattern: &str, mode: SearchMode) -> Result<SearchOutcome> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Search {
            pattern: pattern.to_string(),
            mode,
            reply,
        })?;
        rx.await
            .map_err(|_| AppError::Engine("engine task stopped".into()))?
    }

    #[allow(dead_code)]
    pub async fn capture_state(&self) -> Result<ViewState> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::CaptureState { reply })?;
        rx.await
            .map_err(|_| AppError::Engine("engine task stopped".into()))
    }

    #[allow(dead_code)]
    pub fn apply_state(&self, state: ViewState) -> Result<()> {
        self.send(Command::ApplyState { state })
    }

    #[allow(dead_code)]
    pub fn set_expanded(&self, path: &str, expanded: bool) -> Result<()> {
        self.send(Command::SetExpanded {
            path: path.to_string(),
            expanded,
        })
    }

    /// Path of the currently selected node, if any.
    #[allow(dead_code)]
    pub async fn selected(&self) -> Result<Option<String>> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Selected { reply })?;
        rx.await
            .map_err(|_| AppError::Engine("engine task stopped".into()))
    }
}

/// Single owner of the shared tree state.
///
/// All rebuilds and search starts go through this task's mailbox, which is
/// what serializes them: a rebuild is awaited inline, so no search can
/// start mid-rebuild and no two rebuilds overlap. Searches themselves run
/// on blocking tasks over an `Arc` of the snapshot they started from.
pub struct Engine {
    root: PathBuf,
    snapshot: Arc<Snapshot>,
    flags: ViewFlags,
    known: KnownNames,
    search_seq: u64,
    search_cancel: CancellationToken,
    tx: mpsc::UnboundedSender<Command>,
    rx: mpsc::UnboundedReceiver<Command>,
}

impl Engine {
    /// Start the engine task. The tree is initially just the root; the
    /// caller runs the startup rebuild through the debounce trigger's
    /// `immediate()`.
    pub fn spawn(root: PathBuf, known: KnownNames) -> EngineHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        let snapshot = Arc::new(Snapshot::root_only(root.clone()));
        let flags = ViewFlags::new(&snapshot);
        let engine = Engine {
            root,
            snapshot,
            flags,
            known,
            search_seq: 0,
            search_cancel: CancellationToken::new(),
            tx: tx.clone(),
            rx,
        };
        tokio::spawn(engine.run());
        EngineHandle { tx }
    }

    async fn run(mut self) {
        while let Some(cmd) = self.rx.recv().await {
            match cmd {
                Command::Rebuild { done } => {
                    self.rebuild().await;
                    if let Some(done) = done {
                        let _ = done.send(());
                    }
                }
                Command::CurrentTree { reply } => {
                    let _ = reply.send(Arc::clone(&self.snapshot));
                }
                Command::Search {
                    pattern,
                    mode,
                    reply,
                } => self.start_search(pattern, mode, reply),
                Command::SearchDone { seq, outcome } => self.finish_search(seq, outcome),
                Command::CaptureState { reply } => {
                    let _ = reply.send(view::capture(&self.snapshot, &self.flags));
                }
                Command::ApplyState { state } => {
                    self.flags = view::apply(&self.snapshot, &state);
                }
                Command::SetExpanded { path, expanded } => {
                    if let Some(id) = self.snapshot.find_by_path(&path) {
                        self.flags.set_expanded(id, expanded);
                    }
                }
                Command::Selected { reply } => {
                    let _ = reply
                        .send(self.flags.selected().map(|id| self.snapshot.path(id)));
                }
            }
        }
    }

    /// Capture state, build a fresh snapshot off-thread, restore state and
    /// swap atomically. In-flight searches keep the old snapshot alive via
    /// their `Arc`; their completions re-resolve by path (see
    /// [`Engine::finish_search`]).
    async fn rebuild(&mut self) {
        let state = view::capture(&self.snapshot, &self.flags);
        let root = self.root.clone();
        let built = tokio::task::spawn_blocking(move || builder::build(&root)).await;
        let snapshot = match built {
            Ok(snapshot) => Arc::new(snapshot),
            Err(e) => {
                warn!("tree rebuild task failed: {e}");
                return;
            }
        };
        self.flags = view::apply(&snapshot, &state);
        self.snapshot = snapshot;

        let names = self.snapshot.names();
        match self.known.write() {
            Ok(mut guard) => *guard = names,
            Err(poisoned) => *poisoned.into_inner() = names,
        }
        debug!("rebuilt tree: {} nodes", self.snapshot.len());
    }

    fn start_search(
        &mut self,
        pattern: String,
        mode: SearchMode,
        reply: oneshot::Sender<Result<SearchOutcome>>,
    ) {
        // Reject malformed patterns here; no search starts for them.
        let predicate = match MatchPredicate::parse(&pattern, mode) {
            Ok(predicate) => predicate,
            Err(e) => {
                let _ = reply.send(Err(e));
                return;
            }
        };

        // Supersede the previous search: cancel its token, don't wait.
        self.search_cancel.cancel();
        self.search_cancel = CancellationToken::new();
        self.search_seq += 1;

        let seq = self.search_seq;
        let token = self.search_cancel.clone();
        let snapshot = Arc::clone(&self.snapshot);
        let start = self.flags.selected();
        let actor = self.tx.clone();
        tokio::spawn(async move {
            let outcome =
                tokio::task::spawn_blocking(move || find_next(&snapshot, start, &predicate, &token))
                    .await
                    .unwrap_or(SearchOutcome::Cancelled);
            // Enqueue the selection update before answering the caller so a
            // follow-up query observes it.
            let _ = actor.send(Command::SearchDone {
                seq,
                outcome: outcome.clone(),
            });
            let _ = reply.send(Ok(outcome));
        });
    }

    fn finish_search(&mut self, seq: u64, outcome: SearchOutcome) {
        if seq != self.search_seq {
            debug!("discarding superseded search result");
            return;
        }
        // Selection is keyed by path, so a result computed against an older
        // snapshot lands on the matching node of the current one, or
        // nowhere. NoMatch and Cancelled leave the selection untouched.
        if let SearchOutcome::Found(m) = outcome {
            if let Some(id) = self.snapshot.find_by_path(&m.path) {
                self.flags.select(Some(id));
            }
        }
    }
}
