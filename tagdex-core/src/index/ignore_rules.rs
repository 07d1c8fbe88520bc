//! Directory exclusion rules: ignored directory trees and path fragments.

use crate::config::{Config, Layout};
use crate::paths::absolute_from;
use std::ffi::OsString;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf, MAIN_SEPARATOR};

/// SQLite writes these next to the database file.
const STORE_AUX_SUFFIXES: [&str; 3] = ["-journal", "-wal", "-shm"];

/// Immutable set of traversal exclusions.
///
/// Built once per [`TagIndex`](super::TagIndex) and swapped out as a whole
/// on reload; the enumerator holds its own shared copy while walking.
#[derive(Debug, Clone, Default)]
pub struct IgnoreRules {
    /// Absolute, normalized directory roots.
    dirs: Vec<PathBuf>,
    /// Fragments wrapped as `/frag/`.
    parts: Vec<String>,
    store_files: Vec<PathBuf>,
    /// Symlink-resolved state dir and store files, matched by name first
    /// so the filesystem is only consulted for likely hits.
    real_state_dir: Option<PathBuf>,
    real_store_files: Vec<PathBuf>,
}

impl IgnoreRules {
    /// Build rules from absolute directories and raw fragments.
    pub fn new<D, P>(dirs: D, parts: P) -> Self
    where
        D: IntoIterator<Item = PathBuf>,
        P: IntoIterator,
        P::Item: AsRef<str>,
    {
        Self {
            dirs: dirs.into_iter().collect(),
            parts: parts
                .into_iter()
                .filter_map(|p| wrap_fragment(p.as_ref()))
                .collect(),
            ..Self::default()
        }
    }

    /// Read the ignore files named by the layout, add configured fragments,
    /// and always exclude tagdex's own state.
    pub fn load(layout: &Layout, config: &Config) -> crate::Result<Self> {
        let mut dirs = Vec::new();
        for line in read_rule_lines(&layout.ignore_dirs_file)? {
            dirs.push(absolute_from(Path::new(&line), &layout.home)?);
        }

        let mut parts = read_rule_lines(&layout.ignore_parts_file)?;
        parts.extend(config.ignore.patterns.iter().cloned());

        let rules = Self::new(dirs, parts).with_store(layout)?;
        tracing::debug!(
            dirs = rules.dirs.len(),
            parts = rules.parts.len(),
            "loaded ignore rules"
        );
        Ok(rules)
    }

    /// Exclude the state directory and the database files wherever they live.
    pub fn with_store(mut self, layout: &Layout) -> crate::Result<Self> {
        let state_dir = absolute_from(&layout.state_dir, &layout.home)?;
        self.real_state_dir = canonical_if_exists(&state_dir)?;
        if !self.dirs.contains(&state_dir) {
            self.dirs.push(state_dir);
        }

        let database = absolute_from(&layout.database, &layout.home)?;
        let mut store_files = vec![database.clone()];
        for suffix in STORE_AUX_SUFFIXES {
            let mut aux = OsString::from(database.as_os_str());
            aux.push(suffix);
            store_files.push(PathBuf::from(aux));
        }

        // The journal files may not exist yet, so resolve their directory.
        let real_dir = match database.parent() {
            Some(dir) => canonical_if_exists(dir)?,
            None => None,
        };
        if let Some(real_dir) = real_dir {
            self.real_store_files = store_files
                .iter()
                .filter_map(|f| f.file_name())
                .map(|name| real_dir.join(name))
                .collect();
        }
        self.store_files = store_files;
        Ok(self)
    }

    /// Whether traversal must skip `dir` and everything below it.
    ///
    /// `dir` must already be absolute and normalized.
    pub fn is_dir_excluded(&self, dir: &Path) -> bool {
        if self.dirs.iter().any(|ignored| dir.starts_with(ignored)) {
            return true;
        }
        if self.is_real_state_dir(dir) {
            return true;
        }
        if self.parts.is_empty() {
            return false;
        }

        let mut haystack = dir.to_string_lossy().into_owned();
        if !haystack.ends_with(MAIN_SEPARATOR) {
            haystack.push(MAIN_SEPARATOR);
        }
        self.parts.iter().any(|part| haystack.contains(part.as_str()))
    }

    /// The database or one of its journal files, however `file` reaches it.
    pub fn is_store_file(&self, file: &Path) -> bool {
        if self.store_files.iter().any(|f| f == file) {
            return true;
        }
        let Some(name) = file.file_name() else {
            return false;
        };
        if !self.real_store_files.iter().any(|f| f.file_name() == Some(name)) {
            return false;
        }
        file.parent()
            .and_then(|dir| fs::canonicalize(dir).ok())
            .is_some_and(|real_dir| self.real_store_files.contains(&real_dir.join(name)))
    }

    /// Whether `dir` lies inside the state directory once symlinks are
    /// resolved. Used for walk roots, which are never seen by name alone.
    pub fn is_inside_state_dir(&self, dir: &Path) -> bool {
        match (&self.real_state_dir, fs::canonicalize(dir)) {
            (Some(state), Ok(real)) => real.starts_with(state),
            _ => false,
        }
    }

    fn is_real_state_dir(&self, dir: &Path) -> bool {
        let Some(state) = &self.real_state_dir else {
            return false;
        };
        if dir.file_name() != state.file_name() {
            return false;
        }
        fs::canonicalize(dir).is_ok_and(|real| real == *state)
    }

    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    pub fn parts(&self) -> &[String] {
        &self.parts
    }
}

/// `build` -> `/build/`. Fragments that are empty once separators are
/// stripped would match every path and are dropped.
fn wrap_fragment(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.trim_matches(MAIN_SEPARATOR).is_empty() {
        return None;
    }
    let mut part = String::with_capacity(raw.len() + 2);
    if !raw.starts_with(MAIN_SEPARATOR) {
        part.push(MAIN_SEPARATOR);
    }
    part.push_str(raw);
    if !raw.ends_with(MAIN_SEPARATOR) {
        part.push(MAIN_SEPARATOR);
    }
    Some(part)
}

/// `path` with symlinks resolved, or `None` if it does not exist.
fn canonical_if_exists(path: &Path) -> crate::Result<Option<PathBuf>> {
    match fs::canonicalize(path) {
        Ok(real) => Ok(Some(real)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Non-blank, non-comment lines of a rule file. A missing file has no rules.
fn read_rule_lines(path: &Path) -> crate::Result<Vec<String>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}
