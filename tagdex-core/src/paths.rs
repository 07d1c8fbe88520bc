//! Path normalization shared by the filter, the enumerator and the store

use crate::TagdexError;
use path_absolutize::Absolutize;
use std::path::{Path, PathBuf};

/// Lexically absolute form of `path` against the process working directory.
///
/// `.` and `..` are folded without touching the filesystem, so the result
/// is stable for paths that no longer exist.
pub fn absolute(path: &Path) -> crate::Result<PathBuf> {
    Ok(path.absolutize()?.into_owned())
}

/// Like [`absolute`], but relative paths resolve against `base`.
pub fn absolute_from(path: &Path, base: &Path) -> crate::Result<PathBuf> {
    Ok(path.absolutize_from(base)?.into_owned())
}

/// The record key for a path.
pub fn path_key(path: &Path) -> crate::Result<String> {
    path.to_str()
        .map(str::to_string)
        .ok_or_else(|| TagdexError::NonUtf8Path(path.to_path_buf()))
}

/// Absolutize a user-supplied path string, rejecting the empty string.
pub fn resolve_arg(path: &str) -> crate::Result<PathBuf> {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        return Err(TagdexError::EmptyPath);
    }
    absolute(Path::new(trimmed))
}
