//! Tag index: the record store plus the rules that decide which files are in scope

mod file_discovery;
mod ignore_rules;
mod mutation;
mod reconcile;
mod store;

pub use file_discovery::{FileWalker, Files};
pub use ignore_rules::IgnoreRules;
pub use mutation::{BulkOutcome, TagChange};
pub use reconcile::{Drift, InitStats, RemakeStats};
pub use store::{StoreTx, TagRecord, TagStore};

use crate::config::{Config, Layout, DEFAULT_CONFIG};
use crate::error::TagdexError;
use crate::paths::absolute;
use crate::roots::WatchedRoots;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;

/// Index status information
#[derive(Debug, Serialize)]
pub struct IndexStatus {
    pub records: usize,
    pub tagged_records: usize,
    pub distinct_tags: usize,
    pub watched_roots: usize,
    pub schema_version: i32,
    pub database_size_bytes: u64,
}

/// A tagdex home opened for reading and writing
pub struct TagIndex {
    pub(crate) layout: Layout,
    pub(crate) config: Config,
    pub(crate) store: TagStore,
    pub(crate) walker: FileWalker,
    pub(crate) roots: WatchedRoots,
}

impl TagIndex {
    /// Create `.tagdex/` with a default config, an empty database and an
    /// empty watched-roots file.
    pub fn setup(home: &Path) -> crate::Result<()> {
        let home = absolute(home)?;
        let config = Config::default();
        let layout = Layout::new(&home, &config);

        if layout.config_path.exists() {
            return Err(TagdexError::ConfigExists(layout.config_path));
        }

        fs::create_dir_all(&layout.state_dir)?;
        fs::write(&layout.config_path, DEFAULT_CONFIG)?;
        TagStore::open(&layout.database)?;
        if !layout.roots_file.exists() {
            fs::write(&layout.roots_file, "")?;
        }

        tracing::info!(home = %home.display(), "created tagdex home");
        Ok(())
    }

    /// Open the tagdex home at `home`
    pub fn open(home: &Path) -> crate::Result<Self> {
        let home = absolute(home)?;
        let state_dir = Layout::new(&home, &Config::default()).state_dir;
        if !state_dir.is_dir() {
            return Err(TagdexError::NotInitialized);
        }

        let config_path = state_dir.join("config.toml");
        let config = if config_path.exists() {
            Config::load(&config_path)?
        } else {
            Config::default()
        };
        let layout = Layout::new(&home, &config);

        let store = TagStore::open(&layout.database)?;
        let rules = IgnoreRules::load(&layout, &config)?;
        let roots = WatchedRoots::new(&layout.roots_file);

        Ok(Self {
            walker: FileWalker::new(Arc::new(rules)),
            layout,
            config,
            store,
            roots,
        })
    }

    /// Re-read the ignore files. Walks started before the reload keep the old rules.
    pub fn reload_ignore_rules(&mut self) -> crate::Result<()> {
        let rules = IgnoreRules::load(&self.layout, &self.config)?;
        self.walker = FileWalker::new(Arc::new(rules));
        Ok(())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn rules(&self) -> &IgnoreRules {
        self.walker.rules()
    }

    pub fn watched_roots(&self) -> crate::Result<Vec<String>> {
        self.roots.load()
    }

    /// Every record, ordered by path
    pub fn list_all(&self) -> crate::Result<Vec<TagRecord>> {
        self.store.scan_all()
    }

    /// Get index status
    pub fn status(&self) -> crate::Result<IndexStatus> {
        let records = self.store.scan_all()?;
        let tagged_records = records.iter().filter(|r| !r.tags.is_empty()).count();
        let distinct_tags = records
            .iter()
            .flat_map(|r| r.tags.iter())
            .collect::<BTreeSet<_>>()
            .len();

        let database_size_bytes = match fs::metadata(&self.layout.database) {
            Ok(m) => m.len(),
            Err(e) if e.kind() == ErrorKind::NotFound => 0,
            Err(e) => return Err(e.into()),
        };

        Ok(IndexStatus {
            records: records.len(),
            tagged_records,
            distinct_tags,
            watched_roots: self.roots.load()?.len(),
            schema_version: store::SCHEMA_VERSION,
            database_size_bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_open_requires_setup() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            TagIndex::open(dir.path()),
            Err(TagdexError::NotInitialized)
        ));

        TagIndex::setup(dir.path()).unwrap();
        let index = TagIndex::open(dir.path()).unwrap();
        assert!(index.layout().database.exists());
        assert!(index.watched_roots().unwrap().is_empty());
        assert!(index.list_all().unwrap().is_empty());
    }

    #[test]
    fn test_setup_twice_fails() {
        let dir = TempDir::new().unwrap();
        TagIndex::setup(dir.path()).unwrap();
        assert!(matches!(
            TagIndex::setup(dir.path()),
            Err(TagdexError::ConfigExists(_))
        ));
    }

    #[test]
    fn test_reload_picks_up_new_rules() {
        let dir = TempDir::new().unwrap();
        TagIndex::setup(dir.path()).unwrap();
        let mut index = TagIndex::open(dir.path()).unwrap();
        let build = dir.path().join("build");
        assert!(!index.rules().is_dir_excluded(&build));

        fs::write(dir.path().join(".tagignoredirs"), "build\n").unwrap();
        assert!(!index.rules().is_dir_excluded(&build));

        index.reload_ignore_rules().unwrap();
        assert!(index.rules().is_dir_excluded(&build));
    }

    #[test]
    fn test_status_counts() {
        let dir = TempDir::new().unwrap();
        TagIndex::setup(dir.path()).unwrap();
        let mut index = TagIndex::open(dir.path()).unwrap();

        let tx = index.store.transaction().unwrap();
        tx.upsert("/p/a", &["x", "y"].into_iter().collect()).unwrap();
        tx.upsert("/p/b", &["y"].into_iter().collect()).unwrap();
        tx.insert_if_absent("/p/c").unwrap();
        tx.commit().unwrap();

        let status = index.status().unwrap();
        assert_eq!(status.records, 3);
        assert_eq!(status.tagged_records, 2);
        assert_eq!(status.distinct_tags, 2);
        assert_eq!(status.watched_roots, 0);
        assert_eq!(status.schema_version, 1);
        assert!(status.database_size_bytes > 0);
    }

    #[test]
    fn test_status_propagates_metadata_errors() {
        let dir = TempDir::new().unwrap();
        TagIndex::setup(dir.path()).unwrap();
        let mut index = TagIndex::open(dir.path()).unwrap();

        // A path below a regular file fails with something other than NotFound
        index.layout.database = index.layout.config_path.join("tags.db");
        assert!(matches!(index.status(), Err(TagdexError::Io(_))));

        index.layout.database = dir.path().join("gone.db");
        assert_eq!(index.status().unwrap().database_size_bytes, 0);
    }
}
