//! Configuration for tagdex

use crate::TagdexError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the state directory created under the tagdex home
pub const STATE_DIR: &str = ".tagdex";

/// Default configuration as TOML
pub const DEFAULT_CONFIG: &str = r#"# Tagdex Configuration

[store]
# SQLite database holding the path -> tags records (inside .tagdex/)
database = "tags.db"
# Watched roots, one absolute directory per line (inside .tagdex/)
roots_file = "directories.txt"

[ignore]
# Directories to skip, one per line (relative to the tagdex home)
dirs_file = ".tagignoredirs"
# Path fragments to skip, one per line; "build" matches any /build/ directory
parts_file = ".tagignoreparts"
# Extra fragments, merged with parts_file
patterns = []
"#;

/// Tagdex configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub ignore: IgnoreConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_database")]
    pub database: String,
    #[serde(default = "default_roots_file")]
    pub roots_file: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IgnoreConfig {
    #[serde(default = "default_dirs_file")]
    pub dirs_file: String,
    #[serde(default = "default_parts_file")]
    pub parts_file: String,
    #[serde(default)]
    pub patterns: Vec<String>,
}

fn default_database() -> String {
    "tags.db".to_string()
}
fn default_roots_file() -> String {
    "directories.txt".to_string()
}
fn default_dirs_file() -> String {
    ".tagignoredirs".to_string()
}
fn default_parts_file() -> String {
    ".tagignoreparts".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database: default_database(),
            roots_file: default_roots_file(),
        }
    }
}

impl Default for IgnoreConfig {
    fn default() -> Self {
        Self {
            dirs_file: default_dirs_file(),
            parts_file: default_parts_file(),
            patterns: Vec::new(),
        }
    }
}

impl Config {
    /// Load config from a TOML file
    pub fn load(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse config from TOML string
    pub fn from_toml(content: &str) -> crate::Result<Self> {
        toml::from_str(content).map_err(|e| TagdexError::ConfigParse(e.to_string()))
    }
}

/// On-disk locations derived from a tagdex home and its config.
///
/// Every file tagdex reads or writes is resolved here, so the ignore
/// rules can exclude the state directory without knowing the config.
#[derive(Debug, Clone)]
pub struct Layout {
    pub home: PathBuf,
    pub state_dir: PathBuf,
    pub config_path: PathBuf,
    pub database: PathBuf,
    pub roots_file: PathBuf,
    pub ignore_dirs_file: PathBuf,
    pub ignore_parts_file: PathBuf,
}

impl Layout {
    pub fn new(home: &Path, config: &Config) -> Self {
        let state_dir = home.join(STATE_DIR);
        Self {
            home: home.to_path_buf(),
            config_path: state_dir.join("config.toml"),
            database: state_dir.join(&config.store.database),
            roots_file: state_dir.join(&config.store.roots_file),
            ignore_dirs_file: home.join(&config.ignore.dirs_file),
            ignore_parts_file: home.join(&config.ignore.parts_file),
            state_dir,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_parses() {
        let config = Config::from_toml(DEFAULT_CONFIG).unwrap();
        assert_eq!(config.store.database, "tags.db");
        assert_eq!(config.store.roots_file, "directories.txt");
        assert_eq!(config.ignore.dirs_file, ".tagignoredirs");
        assert!(config.ignore.patterns.is_empty());
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let config = Config::from_toml("[ignore]\npatterns = [\"node_modules\"]\n").unwrap();
        assert_eq!(config.store.database, "tags.db");
        assert_eq!(config.ignore.parts_file, ".tagignoreparts");
        assert_eq!(config.ignore.patterns, vec!["node_modules".to_string()]);
    }

    #[test]
    fn test_invalid_toml_is_config_parse_error() {
        let err = Config::from_toml("[store\n").unwrap_err();
        assert!(matches!(err, TagdexError::ConfigParse(_)));
    }

    #[test]
    fn test_layout_places_store_under_state_dir() {
        let home = Path::new("/data/notes");
        let layout = Layout::new(home, &Config::default());
        assert_eq!(layout.state_dir, home.join(".tagdex"));
        assert_eq!(layout.database, home.join(".tagdex").join("tags.db"));
        assert_eq!(layout.ignore_dirs_file, home.join(".tagignoredirs"));
    }
}
