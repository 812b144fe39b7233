//! Store-agnostic secret records and metadata.
//!
//! A [`SecretRecord`] is the unit both engines move between stores. Records
//! are read from a store and never mutated in place; an update always
//! produces a new record (and, in versioned stores, a new version
//! identifier).

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Write disposition for [`crate::traits::SecretStore::write`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteMode {
    /// The secret must not already exist
    Create,
    /// The secret must already exist; a new version is produced
    Update,
}

/// Platform-agnostic secret representation.
///
/// Field keys are unique (map semantics); iteration order is the key order,
/// which keeps downstream mapping deterministic for identical payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecretRecord {
    /// Name or path of the secret within its store
    pub name: String,

    /// Field map (e.g. `username`, `password`, `host`)
    pub fields: BTreeMap<String, String>,

    /// Store-assigned version/revision identifier
    pub version: String,

    /// When this version was written
    pub last_modified: DateTime<Utc>,

    /// Identifier of the owning store
    pub store: String,
}

impl SecretRecord {
    /// Get a field value by key.
    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }
}

/// Metadata about a secret, as returned by `SecretStore::list` and consumed
/// by the health scorer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecretMetadata {
    /// Secret name
    pub name: String,

    /// Free-form description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// When the secret value last changed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_changed: Option<DateTime<Utc>>,

    /// When the secret was last read
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_accessed: Option<DateTime<Utc>>,

    /// Whether automatic rotation is configured
    #[serde(default)]
    pub rotation_enabled: bool,

    /// Key/value tags attached to the secret
    #[serde(default)]
    pub tags: BTreeMap<String, String>,

    /// Current version identifier
    #[serde(default)]
    pub version: String,

    /// When the secret was first created
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
}

impl SecretMetadata {
    /// Minimal metadata for a named secret.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            last_changed: None,
            last_accessed: None,
            rotation_enabled: false,
            tags: BTreeMap::new(),
            version: String::new(),
            created: None,
        }
    }

    /// Set the last-changed timestamp.
    pub fn with_last_changed(mut self, at: DateTime<Utc>) -> Self {
        self.last_changed = Some(at);
        self
    }

    /// Mark automatic rotation as enabled.
    pub fn with_rotation_enabled(mut self, enabled: bool) -> Self {
        self.rotation_enabled = enabled;
        self
    }

    /// Attach a tag.
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }
}
