//! Adding and removing tags on single files and whole directory trees.

use super::file_discovery::FileWalker;
use super::store::StoreTx;
use super::TagIndex;
use crate::paths::{path_key, resolve_arg};
use crate::tags::{validate_tag, TagSet};
use serde::Serialize;
use std::path::Path;

/// What a single-file mutation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TagChange {
    Added,
    Removed,
    /// The file already had the tag.
    AlreadyPresent,
    /// The file is indexed but lacks the tag.
    Absent,
    /// No record exists for the file.
    NotIndexed,
}

impl TagChange {
    pub fn is_change(self) -> bool {
        matches!(self, Self::Added | Self::Removed)
    }
}

/// Totals for a path-level mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BulkOutcome {
    pub files: usize,
    pub changed: usize,
    pub unchanged: usize,
}

impl BulkOutcome {
    fn record(&mut self, change: TagChange) {
        self.files += 1;
        if change.is_change() {
            self.changed += 1;
        } else {
            self.unchanged += 1;
        }
    }
}

impl TagIndex {
    /// Whether the file at `path` carries `tag`, or `None` when the file
    /// has no record.
    pub fn has_tag(&self, path: &str, tag: &str) -> crate::Result<Option<bool>> {
        let tag = validate_tag(tag)?;
        let key = path_key(&resolve_arg(path)?)?;
        match self.store.get(&key)? {
            Some(record) => Ok(Some(record.tags.contains(tag))),
            None => {
                tracing::warn!("The file '{}' is not in the index", key);
                Ok(None)
            }
        }
    }

    /// Add `tag` to the file at `path`, or to every file below it.
    pub fn add_tag(&mut self, path: &str, tag: &str) -> crate::Result<BulkOutcome> {
        let tag = validate_tag(tag)?;
        let target = resolve_arg(path)?;

        let outcome = self.mutate_path(&target, |tx, key| add_tag_file(tx, key, tag))?;

        tracing::info!(
            path = %target.display(),
            tag,
            files = outcome.files,
            changed = outcome.changed,
            "add_tag"
        );
        Ok(outcome)
    }

    /// Remove `tag` from the file at `path`, or from every file below it.
    pub fn remove_tag(&mut self, path: &str, tag: &str) -> crate::Result<BulkOutcome> {
        let tag = validate_tag(tag)?;
        let target = resolve_arg(path)?;

        let outcome = self.mutate_path(&target, |tx, key| remove_tag_file(tx, key, tag))?;

        tracing::info!(
            path = %target.display(),
            tag,
            files = outcome.files,
            changed = outcome.changed,
            "remove_tag"
        );
        Ok(outcome)
    }

    /// Apply `op` to every target file in one transaction. The first error
    /// aborts the batch and nothing is committed.
    pub(crate) fn mutate_path<F>(&mut self, target: &Path, mut op: F) -> crate::Result<BulkOutcome>
    where
        F: FnMut(&StoreTx<'_>, &str) -> crate::Result<TagChange>,
    {
        let tx = self.store.transaction()?;
        let outcome = for_each_target(&self.walker, target, |key| op(&tx, key))?;
        tx.commit()?;
        Ok(outcome)
    }
}

/// Run `op` on `target` if it is a file, otherwise on every file the
/// walker finds below it. A missing target visits nothing.
fn for_each_target<F>(walker: &FileWalker, target: &Path, mut op: F) -> crate::Result<BulkOutcome>
where
    F: FnMut(&str) -> crate::Result<TagChange>,
{
    let mut outcome = BulkOutcome::default();

    if target.is_file() {
        outcome.record(op(&path_key(target)?)?);
        return Ok(outcome);
    }

    for file in walker.walk(target)? {
        let key = path_key(&file?)?;
        outcome.record(op(&key)?);
    }
    Ok(outcome)
}

/// Add one tag to one file, creating its record if needed.
pub(crate) fn add_tag_file(tx: &StoreTx<'_>, path: &str, tag: &str) -> crate::Result<TagChange> {
    let mut tags = match tx.get(path)? {
        Some(record) => record.tags,
        None => TagSet::new(),
    };

    if !tags.insert(tag) {
        tracing::warn!("Tag '{}' already exists in {}", tag, path);
        return Ok(TagChange::AlreadyPresent);
    }

    tx.upsert(path, &tags)?;
    tracing::debug!("Added tag '{}' to {}", tag, path);
    Ok(TagChange::Added)
}

/// Remove one tag from one file. The record stays even when its set empties.
pub(crate) fn remove_tag_file(
    tx: &StoreTx<'_>,
    path: &str,
    tag: &str,
) -> crate::Result<TagChange> {
    let Some(record) = tx.get(path)? else {
        tracing::warn!("The file '{}' is not in the index", path);
        return Ok(TagChange::NotIndexed);
    };

    let mut tags = record.tags;
    if !tags.remove(tag) {
        tracing::warn!("Tag '{}' does not exist in {}", tag, path);
        return Ok(TagChange::Absent);
    }

    tx.upsert(path, &tags)?;
    tracing::debug!("Removed tag '{}' from {}", tag, path);
    Ok(TagChange::Removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TagdexError;
    use crate::index::TagStore;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_add_tag_file_is_idempotent() {
        let mut store = TagStore::open_in_memory().unwrap();
        let tx = store.transaction().unwrap();
        assert_eq!(add_tag_file(&tx, "/p/a", "x").unwrap(), TagChange::Added);
        assert_eq!(
            add_tag_file(&tx, "/p/a", "x").unwrap(),
            TagChange::AlreadyPresent
        );
        assert_eq!(add_tag_file(&tx, "/p/a", "y").unwrap(), TagChange::Added);
        tx.commit().unwrap();

        let tags = store.get("/p/a").unwrap().unwrap().tags;
        assert_eq!(tags, ["x", "y"].into_iter().collect::<TagSet>());
    }

    #[test]
    fn test_remove_tag_file_outcomes() {
        let mut store = TagStore::open_in_memory().unwrap();
        let tx = store.transaction().unwrap();
        assert_eq!(
            remove_tag_file(&tx, "/p/a", "x").unwrap(),
            TagChange::NotIndexed
        );
        add_tag_file(&tx, "/p/a", "x").unwrap();
        add_tag_file(&tx, "/p/a", "xy").unwrap();
        assert_eq!(remove_tag_file(&tx, "/p/a", "x").unwrap(), TagChange::Removed);
        assert_eq!(remove_tag_file(&tx, "/p/a", "x").unwrap(), TagChange::Absent);
        assert_eq!(remove_tag_file(&tx, "/p/a", "xy").unwrap(), TagChange::Removed);
        tx.commit().unwrap();

        // Emptied records are kept
        let record = store.get("/p/a").unwrap().unwrap();
        assert!(record.tags.is_empty());
    }

    #[test]
    fn test_bulk_outcome_counts() {
        let mut outcome = BulkOutcome::default();
        outcome.record(TagChange::Added);
        outcome.record(TagChange::AlreadyPresent);
        outcome.record(TagChange::NotIndexed);
        assert_eq!(
            outcome,
            BulkOutcome {
                files: 3,
                changed: 1,
                unchanged: 2
            }
        );
    }

    #[test]
    fn test_failed_batch_commits_nothing() {
        let home = TempDir::new().unwrap();
        let proj = TempDir::new().unwrap();
        for name in ["a.cpp", "b.cpp", "c.cpp"] {
            fs::write(proj.path().join(name), "x").unwrap();
        }
        TagIndex::setup(home.path()).unwrap();
        let mut index = TagIndex::open(home.path()).unwrap();
        let a = proj.path().join("a.cpp");
        index.add_tag(a.to_str().unwrap(), "keep").unwrap();
        let before = index.list_all().unwrap();

        let mut calls = 0;
        let result = index.mutate_path(proj.path(), |tx, key| {
            calls += 1;
            if calls == 3 {
                return Err(TagdexError::Io(std::io::Error::other("disk full")));
            }
            add_tag_file(tx, key, "partial")
        });

        assert!(matches!(result, Err(TagdexError::Io(_))));
        assert_eq!(calls, 3);
        assert_eq!(index.list_all().unwrap(), before);
    }
}
