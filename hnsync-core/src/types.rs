//! Domain types for the hnsync ledger.
//!
//! All path keys are repository-relative, forward-slash strings; never
//! absolute paths. All types serialize via serde + serde_yaml.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A strongly-typed remote post identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PostId(pub String);

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for PostId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for PostId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// A strongly-typed remote series identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SeriesId(pub String);

impl fmt::Display for SeriesId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for SeriesId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SeriesId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// A strongly-typed remote publication identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PublicationId(pub String);

impl fmt::Display for PublicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for PublicationId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for PublicationId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Hashing
// ---------------------------------------------------------------------------

/// SHA-256 of `bytes`, lowercase hex encoded.
///
/// This is the content fingerprint used everywhere: ledger checksums, stage
/// checksums and snapshot filenames.
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Serde helper: decode an explicit YAML `null` as the type's default, so a
/// hand-emptied map field loads as an empty map instead of failing.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// ---------------------------------------------------------------------------
// Ledger document
// ---------------------------------------------------------------------------

/// Cached identity of the publication this repository is bound to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicationRecord {
    pub id: PublicationId,
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// A series known to the ledger, keyed in [`Ledger::series`] by its local slug.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesRecord {
    pub id: SeriesId,
    pub name: String,
    pub slug: String,
    /// Ordered member posts, when known (populated by import).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub posts: Option<Vec<PostId>>,
}

/// A published article row, keyed in [`Ledger::articles`] by normalized path.
///
/// `id` is `None` for registered-but-unpublished drafts; a present id means
/// the post existed remotely as of the last successful apply. `checksum` is
/// the SHA-256 of the full file (front matter + body) at that point. `slug`
/// and `title` are display caches refreshed on every remote write so that
/// single-file operations need no front matter re-parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<PostId>,
    pub checksum: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Root of the ledger document persisted at `{root}/hashnode.sum`.
///
/// `BTreeMap` keys keep serialization deterministic: content-equal ledgers
/// produce byte-equal files regardless of insertion order. The ledger is
/// committed to the user's version control system; the stage and snapshot
/// store are not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger {
    pub version: u32,
    pub publication: PublicationRecord,
    #[serde(default, deserialize_with = "null_as_default")]
    pub series: BTreeMap<String, SeriesRecord>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub articles: BTreeMap<String, ArticleRecord>,
}

impl Ledger {
    /// Insert or replace the article row under `path` (already normalized).
    pub fn set_article(&mut self, path: &str, record: ArticleRecord) {
        self.articles.insert(path.to_owned(), record);
    }

    /// Delete the article row under `path`; a missing row is a no-op.
    pub fn remove_article(&mut self, path: &str) {
        self.articles.remove(path);
    }

    /// Insert or replace a series record under its local slug.
    pub fn set_series(&mut self, record: SeriesRecord) {
        self.series.insert(record.slug.clone(), record);
    }

    /// Look up a series id by display name or slug, case-insensitively.
    pub fn resolve_series(&self, name: &str) -> Option<&SeriesRecord> {
        let slug = crate::slug::slugify(name);
        self.series
            .values()
            .find(|s| s.name.eq_ignore_ascii_case(name) || s.slug.eq_ignore_ascii_case(&slug))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newtype_display() {
        assert_eq!(PostId::from("p-1").to_string(), "p-1");
        assert_eq!(SeriesId::from("s-1").to_string(), "s-1");
        assert_eq!(PublicationId::from("pub-1").to_string(), "pub-1");
    }

    #[test]
    fn sha256_hex_known_vector() {
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn resolve_series_matches_name_and_slug() {
        let mut ledger = Ledger {
            version: 1,
            publication: PublicationRecord {
                id: PublicationId::from("pub"),
                slug: "blog".into(),
                title: None,
            },
            series: BTreeMap::new(),
            articles: BTreeMap::new(),
        };
        ledger.set_series(SeriesRecord {
            id: SeriesId::from("s-1"),
            name: "Rust Deep Dives".into(),
            slug: "rust-deep-dives".into(),
            posts: None,
        });

        assert!(ledger.resolve_series("Rust Deep Dives").is_some());
        assert!(ledger.resolve_series("rust-deep-dives").is_some());
        assert!(ledger.resolve_series("unknown").is_none());
    }

    #[test]
    fn article_upsert_and_remove() {
        let mut ledger = Ledger {
            version: 1,
            publication: PublicationRecord {
                id: PublicationId::from("pub"),
                slug: "blog".into(),
                title: None,
            },
            series: BTreeMap::new(),
            articles: BTreeMap::new(),
        };
        ledger.set_article(
            "posts/a.md",
            ArticleRecord {
                id: Some(PostId::from("p-1")),
                checksum: "abc".into(),
                slug: None,
                title: None,
            },
        );
        assert!(ledger.articles.contains_key("posts/a.md"));

        ledger.remove_article("posts/a.md");
        ledger.remove_article("posts/a.md"); // second remove is a no-op
        assert!(ledger.articles.is_empty());
    }
}
