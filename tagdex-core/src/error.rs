//! Error types for tagdex operations

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum TagdexError {
    #[error("Invalid tag {tag:?}: {reason}")]
    InvalidTag { tag: String, reason: &'static str },

    #[error("A path is required for this operation")]
    EmptyPath,

    #[error("Path is not valid UTF-8: {}", .0.display())]
    NonUtf8Path(PathBuf),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Walk error: {0}")]
    Walk(#[from] ignore::Error),

    #[error("Not a tagdex home (no .tagdex directory). Run 'tagdex setup' first.")]
    NotInitialized,

    #[error("Config already exists at {}", .0.display())]
    ConfigExists(PathBuf),

    #[error("Config parse error: {0}")]
    ConfigParse(String),

    #[error("Schema version mismatch: database is v{found}, expected v{expected}. Remove the database and run 'tagdex remake' to rebuild it.")]
    SchemaVersionMismatch { found: i32, expected: i32 },
}
