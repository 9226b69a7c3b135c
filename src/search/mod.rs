pub mod engine;
pub mod grep;

use std::path::MAIN_SEPARATOR;

use regex::Regex;

use crate::error::{AppError, Result};

/// How a pattern string from user input is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
    /// Substring match against node names, or against full paths when the
    /// pattern itself contains a path separator.
    Name,
    /// Regex match against file contents.
    Content,
}

/// Position of a content match: 1-based row, 0-based byte column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrepPosition {
    pub row: usize,
    pub column: usize,
}

/// Match strategy, evaluated by the search engine at a single dispatch
/// point so new strategies never touch traversal logic.
#[derive(Debug, Clone)]
pub enum MatchPredicate {
    NameOrPathContains { pattern: String, match_path: bool },
    ContentMatchesRegex { regex: Regex },
}

impl MatchPredicate {
    /// Build a predicate from raw user input. Content patterns are
    /// validated here, before any search starts; `find_next` never sees a
    /// malformed pattern.
    pub fn parse(pattern: &str, mode: SearchMode) -> Result<Self> {
        match mode {
            SearchMode::Name => {
                let match_path = pattern.contains('/') || pattern.contains('\\');
                let normalized = pattern
                    .to_lowercase()
                    .chars()
                    .map(|c| if c == '/' || c == '\\' { MAIN_SEPARATOR } else { c })
                    .collect();
                Ok(Self::NameOrPathContains {
                    pattern: normalized,
                    match_path,
                })
            }
            SearchMode::Content => {
                let regex =
                    Regex::new(pattern).map_err(|e| AppError::InvalidPattern(e.to_string()))?;
                Ok(Self::ContentMatchesRegex { regex })
            }
        }
    }
}

/// Terminal state of one search. Cancellation is a normal outcome, not an
/// error, and is distinct from "no match".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    Found(FoundMatch),
    NoMatch,
    Cancelled,
}

/// A matched node, identified by its derived path so the result stays
/// meaningful even if a rebuild swapped the snapshot mid-search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoundMatch {
    pub path: String,
    /// Present for content matches only.
    pub position: Option<GrepPosition>,
}
