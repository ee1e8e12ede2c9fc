//! Attribution data model.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::codec::SCHEMA_VERSION;

/// Slack allowed when checking that portions sum to at most 1.
pub const PORTION_TOLERANCE: f64 = 1e-9;

/// One contribution claim against a commit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributionEntry {
    /// Human or agent identity.
    pub contributor: String,

    /// Tool or model that produced the change.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool: Option<String>,

    /// Share of the commit's change attributed to this entry, in `[0, 1]`.
    pub portion: f64,

    /// When the claim was recorded.
    pub timestamp: DateTime<Utc>,

    /// Opaque annotations, carried through merges untouched.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, Value>,
}

impl AttributionEntry {
    /// Create an entry timestamped now.
    #[must_use]
    pub fn new(contributor: impl Into<String>, tool: Option<&str>, portion: f64) -> Self {
        Self {
            contributor: contributor.into(),
            tool: tool.map(String::from),
            portion,
            timestamp: Utc::now(),
            extra: BTreeMap::new(),
        }
    }

    /// Replace the timestamp.
    #[must_use]
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Add an `extra` annotation.
    #[must_use]
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Identity used to deduplicate entries: `(contributor, tool)`.
    #[must_use]
    pub fn key(&self) -> EntryKey {
        EntryKey {
            contributor: self.contributor.clone(),
            tool: self.tool.clone(),
        }
    }
}

/// `(contributor, tool)` pair identifying who an entry credits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryKey {
    pub contributor: String,
    pub tool: Option<String>,
}

/// The attribution attached to a single commit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributionRecord {
    /// Format tag, `attrib/<major>.<minor>`.
    pub schema_version: String,

    /// Hex SHA-256 of the commit's diff when the record was last written.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_fingerprint: Option<String>,

    /// Contribution claims in insertion order.
    pub entries: Vec<AttributionEntry>,
}

impl AttributionRecord {
    /// Create a record in the current schema version.
    #[must_use]
    pub fn new(entries: Vec<AttributionEntry>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            content_fingerprint: None,
            entries,
        }
    }

    /// Set the content fingerprint.
    #[must_use]
    pub fn with_fingerprint(mut self, fingerprint: impl Into<String>) -> Self {
        self.content_fingerprint = Some(fingerprint.into());
        self
    }

    /// Check if the record carries no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all entry portions.
    #[must_use]
    pub fn total_portion(&self) -> f64 {
        self.entries.iter().map(|e| e.portion).sum()
    }

    /// Check that portions sum to at most 1, within [`PORTION_TOLERANCE`].
    #[must_use]
    pub fn is_conserved(&self) -> bool {
        self.total_portion() <= 1.0 + PORTION_TOLERANCE
    }

    /// Find the entry for a contributor/tool pair.
    #[must_use]
    pub fn entry(&self, contributor: &str, tool: Option<&str>) -> Option<&AttributionEntry> {
        self.entries
            .iter()
            .find(|e| e.contributor == contributor && e.tool.as_deref() == tool)
    }
}
