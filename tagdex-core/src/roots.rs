//! Watched roots: the directories `remake` re-scans.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::PathBuf;

/// Line-oriented list of watched root directories, kept in insertion order.
#[derive(Debug, Clone)]
pub struct WatchedRoots {
    file: PathBuf,
}

impl WatchedRoots {
    pub fn new(file: impl Into<PathBuf>) -> Self {
        Self { file: file.into() }
    }

    /// All roots in file order. A missing file means no roots.
    pub fn load(&self) -> crate::Result<Vec<String>> {
        let content = match fs::read_to_string(&self.file) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        Ok(content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }

    /// Append `root` unless the exact string is already listed.
    /// Returns true if it was appended.
    pub fn add(&self, root: &str) -> crate::Result<bool> {
        if self.load()?.iter().any(|existing| existing == root) {
            return Ok(false);
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.file)?;
        writeln!(file, "{}", root)?;
        Ok(true)
    }
}
