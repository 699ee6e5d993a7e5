use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A paste as published by the feed provider.
///
/// The listing call yields pastes with an empty `content`; the fetch call
/// fills it in before the paste is handed to the store. `full_url` and
/// `scrape_url` from the provider are not kept since both derive from `key`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paste {
    /// Provider-assigned identifier, unique and stable.
    pub key: String,
    /// Publication time as unix seconds, kept verbatim.
    #[serde(default)]
    pub date: String,
    /// Expiry as unix seconds, "0" for never.
    #[serde(default)]
    pub expire: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub syntax: String,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub content: String,
}

impl Paste {
    /// Listing-stage paste with just a key, mostly useful for tests and tooling.
    pub fn with_key(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Default::default()
        }
    }

    /// Parse `date` into a timestamp. Returns `None` when empty or malformed.
    pub fn published_at(&self) -> Option<DateTime<Utc>> {
        let secs: i64 = self.date.trim().parse().ok()?;
        DateTime::from_timestamp(secs, 0)
    }

    /// SHA-256 of the fetched content.
    pub fn content_hash(&self) -> String {
        compute_hash(&self.content)
    }
}

/// Compute a SHA-256 hash of a string, returned as 64-char hex.
pub fn compute_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}
