//! Tag sets and their storage encoding

use crate::TagdexError;
use serde::Serialize;
use std::collections::BTreeSet;

/// Separator between tags in the stored column. Reserved: no tag may contain it.
pub const TAG_DELIMITER: &str = "/\\";

/// Reject tags that cannot round-trip through storage and return the tag
/// with surrounding whitespace stripped, the form every operation stores
/// and compares.
pub fn validate_tag(tag: &str) -> crate::Result<&str> {
    let trimmed = tag.trim();
    if trimmed.is_empty() {
        return Err(TagdexError::InvalidTag {
            tag: tag.to_string(),
            reason: "tag must not be empty",
        });
    }
    if tag.contains(TAG_DELIMITER) {
        return Err(TagdexError::InvalidTag {
            tag: tag.to_string(),
            reason: "tag contains the reserved sequence /\\",
        });
    }
    Ok(trimmed)
}

/// Split a comma-separated tag list, trimming entries and dropping empty ones.
pub fn split_tag_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// The tags attached to one file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TagSet(BTreeSet<String>);

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.0.contains(tag)
    }

    /// Returns false if the tag was already present.
    pub fn insert(&mut self, tag: &str) -> bool {
        self.0.insert(tag.to_string())
    }

    /// Returns false if the tag was not present.
    pub fn remove(&mut self, tag: &str) -> bool {
        self.0.remove(tag)
    }

    /// AND match: every requested tag is present. An empty request matches.
    pub fn contains_all<S: AsRef<str>>(&self, tags: &[S]) -> bool {
        tags.iter().all(|t| self.0.contains(t.as_ref()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Storage form: every tag followed by the delimiter, e.g. `algo/\dp/\`.
    pub fn encode(&self) -> String {
        let mut out = String::new();
        for tag in &self.0 {
            out.push_str(tag);
            out.push_str(TAG_DELIMITER);
        }
        out
    }

    pub fn decode(raw: &str) -> Self {
        Self(
            raw.split(TAG_DELIMITER)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }
}

impl<S: Into<String>> FromIterator<S> for TagSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_tag() {
        assert!(validate_tag("segment tree").is_ok());
        assert!(matches!(
            validate_tag(""),
            Err(TagdexError::InvalidTag { .. })
        ));
        assert!(matches!(
            validate_tag("   "),
            Err(TagdexError::InvalidTag { .. })
        ));
        assert!(matches!(
            validate_tag("a/\\b"),
            Err(TagdexError::InvalidTag { .. })
        ));
        // A lone slash or backslash is fine; only the pair is reserved
        assert!(validate_tag("c/c++").is_ok());
        assert!(validate_tag("dir\\name").is_ok());
        assert_eq!(validate_tag("  segment tree ").unwrap(), "segment tree");
    }

    #[test]
    fn test_encode_decode() {
        let tags: TagSet = ["dp", "algo", "segment tree"].into_iter().collect();
        let encoded = tags.encode();
        assert_eq!(encoded, "algo/\\dp/\\segment tree/\\");
        assert_eq!(TagSet::decode(&encoded), tags);
        assert!(TagSet::decode("").is_empty());
    }

    #[test]
    fn test_membership_is_exact() {
        let tags: TagSet = ["ab", "abc"].into_iter().collect();
        assert!(!tags.contains("a"));
        assert!(!tags.contains("b"));
        assert!(tags.contains("ab"));
        assert!(!tags.contains_all(&["a"]));
        assert!(tags.contains_all(&["ab", "abc"]));
        assert!(tags.contains_all::<&str>(&[]));
    }

    #[test]
    fn test_insert_remove_report_change() {
        let mut tags = TagSet::new();
        assert!(tags.insert("x"));
        assert!(!tags.insert("x"));
        assert_eq!(tags.len(), 1);
        assert!(tags.remove("x"));
        assert!(!tags.remove("x"));
        assert!(tags.is_empty());
    }

    #[test]
    fn test_split_tag_list() {
        assert_eq!(
            split_tag_list(" algo, dp ,,graphs "),
            vec!["algo".to_string(), "dp".to_string(), "graphs".to_string()]
        );
        assert!(split_tag_list("  ").is_empty());
    }
}
