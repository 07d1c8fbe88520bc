//! Tag queries: files carrying every requested tag

use crate::index::TagIndex;
use crate::paths::{path_key, resolve_arg};
use crate::tags::validate_tag;

impl TagIndex {
    /// Paths of indexed files that carry all of `tags`, sorted.
    ///
    /// An empty `path` searches every record. Otherwise only files the
    /// walker finds below `path` are considered, and files without a
    /// record are skipped rather than indexed on the fly.
    pub fn find<S: AsRef<str>>(&self, path: &str, tags: &[S]) -> crate::Result<Vec<String>> {
        let tags = tags
            .iter()
            .map(|tag| validate_tag(tag.as_ref()))
            .collect::<crate::Result<Vec<_>>>()?;

        let mut matches = if path.trim().is_empty() {
            self.store
                .scan_all()?
                .into_iter()
                .filter(|record| record.tags.contains_all(tags.as_slice()))
                .map(|record| record.path)
                .collect::<Vec<_>>()
        } else {
            let root = resolve_arg(path)?;
            let mut matches = Vec::new();
            for file in self.walker.walk(&root)? {
                let key = path_key(&file?)?;
                if let Some(record) = self.store.get(&key)? {
                    if record.tags.contains_all(tags.as_slice()) {
                        matches.push(record.path);
                    }
                }
            }
            matches
        };

        matches.sort();
        tracing::debug!(path, tags = tags.len(), matches = matches.len(), "find");
        Ok(matches)
    }
}
