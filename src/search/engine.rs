use tokio_util::sync::CancellationToken;

use crate::fs::snapshot::{NodeId, NodeKind, Snapshot};

use super::{grep, FoundMatch, GrepPosition, MatchPredicate, SearchOutcome};

/// Find the next node in document order that satisfies the predicate.
///
/// The arena is stored in pre-order, so "subtree of `start`, then following
/// siblings, then each ancestor's next sibling" is simply every index after
/// `start`. The first pass excludes `start` itself; if it exhausts the tree
/// and the origin was not the root, exactly one wraparound pass rescans the
/// whole tree, this time without excluding anything. The root sentinel
/// (index 0, the invisible tree root) never matches.
///
/// The token is checked at every node visit; a cancelled search returns
/// [`SearchOutcome::Cancelled`] promptly and never a partial result.
pub fn find_next(
    snapshot: &Snapshot,
    start: Option<NodeId>,
    predicate: &MatchPredicate,
    token: &CancellationToken,
) -> SearchOutcome {
    let len = snapshot.len();
    let root = snapshot.root();
    let origin = start.unwrap_or(root);

    let first_pass = (origin + 1)..len;
    match scan(snapshot, first_pass, predicate, token) {
        Scan::Found(m) => return SearchOutcome::Found(m),
        Scan::Cancelled => return SearchOutcome::Cancelled,
        Scan::Exhausted => {}
    }

    if origin == root {
        // The first pass already covered the whole tree; no wraparound.
        return SearchOutcome::NoMatch;
    }

    match scan(snapshot, (root + 1)..len, predicate, token) {
        Scan::Found(m) => SearchOutcome::Found(m),
        Scan::Cancelled => SearchOutcome::Cancelled,
        Scan::Exhausted => SearchOutcome::NoMatch,
    }
}

enum Scan {
    Found(FoundMatch),
    Exhausted,
    Cancelled,
}

fn scan(
    snapshot: &Snapshot,
    ids: impl Iterator<Item = NodeId>,
    predicate: &MatchPredicate,
    token: &CancellationToken,
) -> Scan {
    for id in ids {
        if token.is_cancelled() {
            return Scan::Cancelled;
        }
        if let Some(position) = node_matches(snapshot, id, predicate) {
            return Scan::Found(FoundMatch {
                path: snapshot.path(id),
                position,
            });
        }
    }
    Scan::Exhausted
}

/// The single dispatch point for match strategies. Returns `Some` on a
/// match, carrying the grep position for content predicates.
fn node_matches(
    snapshot: &Snapshot,
    id: NodeId,
    predicate: &MatchPredicate,
) -> Option<Option<GrepPosition>> {
    match predicate {
        MatchPredicate::NameOrPathContains {
            pattern,
            match_path,
        } => {
            let haystack = if *match_path {
                snapshot.path(id).to_lowercase()
            } else {
                snapshot.node(id).name.to_lowercase()
            };
            haystack.contains(pattern.as_str()).then_some(None)
        }
        MatchPredicate::ContentMatchesRegex { regex } => {
            if snapshot.node(id).kind != NodeKind::File {
                return None;
            }
            grep::file_position(&snapshot.absolute_path(id), regex).map(Some)
        }
    }
}
