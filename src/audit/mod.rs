//! Append-only audit trail for engine operations.
//!
//! Every completed rotation or sync operation appends an [`AuditEntry`].
//! The log is monotonically append-only and ordered by insertion; no
//! update or delete surface exists. It can be exported as an ordered JSON
//! list to any caller-supplied sink.

use std::collections::BTreeMap;
use std::io::Write;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::EngineResult;

/// Immutable record of one engine operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Operation kind: `sync`, `rotation`, `rollback`, `schedule`
    pub operation: String,

    /// Secret the operation acted on
    pub secret_name: String,

    /// Sync direction, when the operation has one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<String>,

    /// Terminal status of the operation
    pub status: String,

    /// Who performed the operation
    pub actor: String,

    /// When the entry was appended
    pub timestamp: DateTime<Utc>,

    /// Operation-specific details (version identifiers, durations, ...)
    #[serde(default)]
    pub details: BTreeMap<String, Value>,
}

impl AuditEntry {
    /// Create an entry with the current timestamp.
    pub fn new(
        operation: impl Into<String>,
        secret_name: impl Into<String>,
        status: impl Into<String>,
        actor: impl Into<String>,
    ) -> Self {
        Self {
            operation: operation.into(),
            secret_name: secret_name.into(),
            direction: None,
            status: status.into(),
            actor: actor.into(),
            timestamp: Utc::now(),
            details: BTreeMap::new(),
        }
    }

    /// Attach a sync direction.
    pub fn with_direction(mut self, direction: impl Into<String>) -> Self {
        self.direction = Some(direction.into());
        self
    }

    /// Attach a detail value.
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }
}

/// Append-only, insertion-ordered sequence of [`AuditEntry`].
///
/// Shared between the coordinator and the sync engine via `Arc`; appends
/// take a short mutex, reads clone the entries out.
#[derive(Debug, Default)]
pub struct AuditLog {
    entries: Mutex<Vec<AuditEntry>>,
}

impl AuditLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry. Entries are never mutated or removed afterwards.
    pub fn append(&self, entry: AuditEntry) {
        tracing::info!(
            operation = %entry.operation,
            secret = %entry.secret_name,
            status = %entry.status,
            "audit entry appended"
        );
        self.entries.lock().push(entry);
    }

    /// Snapshot of all entries in insertion order.
    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries.lock().clone()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether the log is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Serialize the ordered entry list as pretty JSON into `sink`.
    pub fn export_json<W: Write>(&self, sink: &mut W) -> EngineResult<()> {
        let entries = self.entries();
        serde_json::to_writer_pretty(&mut *sink, &entries)?;
        sink.flush()?;
        tracing::info!(entries = entries.len(), "exported audit log");
        Ok(())
    }
}
