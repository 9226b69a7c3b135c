use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use regex::Regex;

use super::GrepPosition;

/// Scan a file line by line and report the first regex match as a 1-based
/// row and 0-based byte column.
///
/// A file that no longer exists or cannot be read is a non-match, never an
/// error; the same goes for a read failure partway through. Lines are
/// converted lossily so binary-ish content degrades to a non-match instead
/// of aborting the scan.
pub fn file_position(path: &Path, pattern: &Regex) -> Option<GrepPosition> {
    let file = File::open(path).ok()?;
    let mut reader = BufReader::new(file);
    let mut raw = Vec::new();
    let mut row = 0usize;

    loop {
        raw.clear();
        match reader.read_until(b'\n', &mut raw) {
            Ok(0) | Err(_) => return None,
            Ok(_) => {}
        }
        row += 1;
        while matches!(raw.last(), Some(b'\n') | Some(b'\r')) {
            raw.pop();
        }
        let line = String::from_utf8_lossy(&raw);
        if let Some(m) = pattern.find(&line) {
            return Some(GrepPosition {
                row,
                column: m.start(),
            });
        }
    }
}
