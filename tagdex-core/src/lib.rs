//! Tagdex Core - Tag files by path and query them by tag
//!
//! This library keeps a persistent path -> tag set index, walks directory
//! trees under configurable ignore rules, and reconciles the index with
//! the filesystem when files move or disappear.

pub mod config;
pub mod error;
pub mod index;
pub mod paths;
pub mod query;
pub mod roots;
pub mod tags;

pub use config::{Config, Layout};
pub use error::TagdexError;
pub use index::{
    BulkOutcome, Drift, FileWalker, IgnoreRules, IndexStatus, InitStats, RemakeStats, TagChange,
    TagIndex, TagRecord, TagStore,
};
pub use roots::WatchedRoots;
pub use tags::{split_tag_list, validate_tag, TagSet, TAG_DELIMITER};

/// Result type alias for tagdex operations
pub type Result<T> = std::result::Result<T, TagdexError>;
