//! File discovery: lazy, rule-pruned walks below a root.

use super::ignore_rules::IgnoreRules;
use crate::paths::absolute;
use ignore::{Walk, WalkBuilder};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Walks directory trees, pruning every directory the rules exclude.
#[derive(Debug, Clone)]
pub struct FileWalker {
    rules: Arc<IgnoreRules>,
}

impl FileWalker {
    pub fn new(rules: Arc<IgnoreRules>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &IgnoreRules {
        &self.rules
    }

    /// Absolute paths of the files under `root`.
    ///
    /// A missing root yields nothing; a root that is itself a file yields
    /// just that file. Each call starts a fresh walk.
    pub fn walk(&self, root: &Path) -> crate::Result<Files> {
        let root = absolute(root)?;

        let metadata = match std::fs::metadata(&root) {
            Ok(m) => m,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(root = %root.display(), "walk root does not exist");
                return Ok(Files::empty(self.rules.clone()));
            }
            Err(e) => return Err(e.into()),
        };

        // The walker never filters its root entry, so check it here.
        let root_dir = if metadata.is_dir() {
            Some(root.as_path())
        } else {
            root.parent()
        };
        if root_dir.is_some_and(|dir| {
            self.rules.is_dir_excluded(dir) || self.rules.is_inside_state_dir(dir)
        }) {
            tracing::debug!(root = %root.display(), "walk root is ignored");
            return Ok(Files::empty(self.rules.clone()));
        }

        let rules = self.rules.clone();
        let mut builder = WalkBuilder::new(&root);
        builder.standard_filters(false);
        builder.follow_links(false);
        builder.filter_entry(move |entry| match entry.file_type() {
            Some(ft) if ft.is_dir() => !rules.is_dir_excluded(entry.path()),
            _ => true,
        });

        Ok(Files {
            inner: Some(builder.build()),
            rules: self.rules.clone(),
        })
    }
}

/// Iterator returned by [`FileWalker::walk`].
pub struct Files {
    inner: Option<Walk>,
    rules: Arc<IgnoreRules>,
}

impl Files {
    fn empty(rules: Arc<IgnoreRules>) -> Self {
        Self { inner: None, rules }
    }
}

impl Iterator for Files {
    type Item = crate::Result<PathBuf>;

    fn next(&mut self) -> Option<Self::Item> {
        let walk = self.inner.as_mut()?;
        loop {
            let entry = match walk.next()? {
                Ok(entry) => entry,
                Err(e) => return Some(Err(e.into())),
            };

            let is_file = match entry.file_type() {
                Some(ft) if ft.is_file() => true,
                Some(ft) if ft.is_symlink() => entry.path().is_file(),
                _ => false,
            };
            if !is_file {
                continue;
            }

            let path = entry.into_path();
            if self.rules.is_store_file(&path) {
                continue;
            }
            if path.to_str().is_none() {
                tracing::warn!(path = %path.display(), "skipping file with non UTF-8 path");
                continue;
            }
            return Some(Ok(path));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "x").unwrap();
    }

    fn collect(walker: &FileWalker, root: &Path) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = walker
            .walk(root)
            .unwrap()
            .collect::<crate::Result<_>>()
            .unwrap();
        files.sort();
        files
    }

    #[test]
    fn test_walk_yields_absolute_files_recursively() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        touch(root, "a.cpp");
        touch(root, "sub/b.cpp");
        touch(root, "sub/deeper/.hidden");
        fs::create_dir_all(root.join("empty")).unwrap();

        let walker = FileWalker::new(Arc::new(IgnoreRules::default()));
        let files = collect(&walker, root);

        assert_eq!(
            files,
            vec![
                root.join("a.cpp"),
                root.join("sub/b.cpp"),
                root.join("sub/deeper/.hidden"),
            ]
        );
        assert!(files.iter().all(|p| p.is_absolute()));
    }

    #[test]
    fn test_walk_prunes_ignored_subtrees() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        touch(root, "src/main.cpp");
        touch(root, "build/out.o");
        touch(root, "build/nested/deep.o");
        touch(root, "lib/node_modules/pkg/index.js");
        touch(root, "builder/keep.txt");

        let rules = IgnoreRules::new(vec![root.join("build")], ["node_modules"]);
        let walker = FileWalker::new(Arc::new(rules));
        let files = collect(&walker, root);

        assert_eq!(
            files,
            vec![root.join("builder/keep.txt"), root.join("src/main.cpp")]
        );
    }

    #[test]
    fn test_walk_missing_root_is_empty() {
        let dir = TempDir::new().unwrap();
        let walker = FileWalker::new(Arc::new(IgnoreRules::default()));
        assert!(collect(&walker, &dir.path().join("nope")).is_empty());
    }

    #[test]
    fn test_walk_file_root_yields_itself() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "one.txt");
        touch(dir.path(), "two.txt");
        let walker = FileWalker::new(Arc::new(IgnoreRules::default()));
        assert_eq!(
            collect(&walker, &dir.path().join("one.txt")),
            vec![dir.path().join("one.txt")]
        );
    }

    #[test]
    fn test_walk_ignored_root_is_empty() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "build/out.o");
        let rules = IgnoreRules::new(vec![dir.path().join("build")], Vec::<String>::new());
        let walker = FileWalker::new(Arc::new(rules));
        assert!(collect(&walker, &dir.path().join("build")).is_empty());
        assert!(collect(&walker, &dir.path().join("build/out.o")).is_empty());
    }

    #[test]
    fn test_walk_is_restartable() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "a");
        let walker = FileWalker::new(Arc::new(IgnoreRules::default()));
        assert_eq!(collect(&walker, dir.path()), collect(&walker, dir.path()));
    }
}
