//! Bringing the index in line with the filesystem: init, remake and compare.

use super::TagIndex;
use crate::paths::{path_key, resolve_arg};
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};
use std::path::Path;

/// Statistics from `init`
#[derive(Debug, Serialize)]
pub struct InitStats {
    pub root: String,
    pub files_seen: usize,
    pub files_added: usize,
    pub newly_watched: bool,
}

/// Statistics from `remake`
#[derive(Debug, Serialize)]
pub struct RemakeStats {
    pub roots: usize,
    pub files_discovered: usize,
    pub records_added: usize,
    pub records_pruned: usize,
}

/// Differences between the index and the watched roots on disk.
#[derive(Debug, Default, PartialEq, Eq, Serialize)]
pub struct Drift {
    /// Indexed paths no watched root contains anymore.
    pub missing_on_disk: Vec<String>,
    /// Files under watched roots that have no record.
    pub unindexed: Vec<String>,
}

impl Drift {
    pub fn is_clean(&self) -> bool {
        self.missing_on_disk.is_empty() && self.unindexed.is_empty()
    }
}

impl TagIndex {
    /// Index every file below `path` and start watching it.
    ///
    /// Existing records keep their tags.
    pub fn init(&mut self, path: &str) -> crate::Result<InitStats> {
        let root = resolve_arg(path)?;
        let root_key = path_key(&root)?;

        let tx = self.store.transaction()?;
        let mut files_seen = 0;
        let mut files_added = 0;
        for file in self.walker.walk(&root)? {
            let key = path_key(&file?)?;
            files_seen += 1;
            if tx.insert_if_absent(&key)? {
                files_added += 1;
            }
        }
        tx.commit()?;

        let newly_watched = self.roots.add(&root_key)?;
        tracing::info!(
            root = %root_key,
            files_seen,
            files_added,
            newly_watched,
            "init"
        );

        Ok(InitStats {
            root: root_key,
            files_seen,
            files_added,
            newly_watched,
        })
    }

    /// Rebuild index membership from the watched roots.
    ///
    /// New files get empty records; records for files no root contains
    /// are deleted. A moved or renamed file is a new path and loses its tags.
    pub fn remake(&mut self) -> crate::Result<RemakeStats> {
        let roots = self.roots.load()?;

        let tx = self.store.transaction()?;
        let mut seen: HashSet<String> = HashSet::new();
        let mut records_added = 0;
        for root in &roots {
            let root = Path::new(root);
            if !root.exists() {
                tracing::warn!(root = %root.display(), "watched root does not exist");
            }
            for file in self.walker.walk(root)? {
                let key = path_key(&file?)?;
                if tx.insert_if_absent(&key)? {
                    tracing::debug!(path = %key, "indexed new file");
                    records_added += 1;
                }
                seen.insert(key);
            }
        }

        let mut records_pruned = 0;
        for record in tx.scan_all()? {
            if !seen.contains(&record.path) {
                tx.delete(&record.path)?;
                tracing::debug!(path = %record.path, "pruned missing file");
                records_pruned += 1;
            }
        }
        tx.commit()?;

        let stats = RemakeStats {
            roots: roots.len(),
            files_discovered: seen.len(),
            records_added,
            records_pruned,
        };
        tracing::info!(
            roots = stats.roots,
            files = stats.files_discovered,
            added = stats.records_added,
            pruned = stats.records_pruned,
            "remake"
        );
        Ok(stats)
    }

    /// Report what `remake` would change, without writing anything.
    pub fn compare(&self) -> crate::Result<Drift> {
        let mut on_disk: BTreeSet<String> = BTreeSet::new();
        for root in self.roots.load()? {
            for file in self.walker.walk(Path::new(&root))? {
                on_disk.insert(path_key(&file?)?);
            }
        }

        let mut drift = Drift::default();
        let mut indexed: HashSet<String> = HashSet::new();
        for record in self.store.scan_all()? {
            if !on_disk.contains(&record.path) {
                drift.missing_on_disk.push(record.path.clone());
            }
            indexed.insert(record.path);
        }
        drift.unindexed = on_disk
            .into_iter()
            .filter(|path| !indexed.contains(path))
            .collect();

        Ok(drift)
    }
}
