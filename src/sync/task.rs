//! Sync task descriptors, per-item results and batch reports.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which way a sync moves data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncDirection {
    AToB,
    BToA,
    Bidirectional,
}

impl std::fmt::Display for SyncDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::AToB => "a_to_b",
            Self::BToA => "b_to_a",
            Self::Bidirectional => "bidirectional",
        };
        f.write_str(s)
    }
}

/// What to do when the destination already holds the secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
    /// Destination is overwritten unconditionally
    OverwriteDestination,
    /// Existing destination values are left alone
    Skip,
    /// Bidirectional only: the strictly newer side wins; ties go to A
    UseNewest,
    /// Divergence is surfaced as a conflict for a human to resolve
    Manual,
}

/// Terminal status of one sync item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    Success,
    Failed,
    Skipped,
    Conflict,
}

impl std::fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
            Self::Conflict => "conflict",
        };
        f.write_str(s)
    }
}

/// Description of one sync to perform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncTask {
    pub secret_name: String,
    pub direction: SyncDirection,
    pub policy: ConflictPolicy,
    pub dry_run: bool,
}

impl SyncTask {
    pub fn new(
        secret_name: impl Into<String>,
        direction: SyncDirection,
        policy: ConflictPolicy,
    ) -> Self {
        Self {
            secret_name: secret_name.into(),
            direction,
            policy,
            dry_run: false,
        }
    }

    pub fn dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }
}

/// Outcome of one sync item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncResult {
    pub secret_name: String,
    pub direction: SyncDirection,
    pub status: SyncStatus,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dest_version: Option<String>,
}

impl SyncResult {
    pub fn new(
        secret_name: impl Into<String>,
        direction: SyncDirection,
        status: SyncStatus,
        message: impl Into<String>,
    ) -> Self {
        Self {
            secret_name: secret_name.into(),
            direction,
            status,
            message: message.into(),
            timestamp: Utc::now(),
            source_version: None,
            dest_version: None,
        }
    }

    pub fn with_versions(
        mut self,
        source_version: impl Into<String>,
        dest_version: impl Into<String>,
    ) -> Self {
        self.source_version = Some(source_version.into());
        self.dest_version = Some(dest_version.into());
        self
    }
}

/// Aggregate outcome of a batch, results in input order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncReport {
    pub direction: SyncDirection,
    pub dry_run: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub results: Vec<SyncResult>,
}

impl SyncReport {
    pub fn total(&self) -> usize {
        self.results.len()
    }

    pub fn count(&self, status: SyncStatus) -> usize {
        self.results.iter().filter(|r| r.status == status).count()
    }

    /// Percentage of successful items; 0.0 for an empty batch.
    pub fn success_rate(&self) -> f64 {
        if self.results.is_empty() {
            return 0.0;
        }
        self.count(SyncStatus::Success) as f64 / self.results.len() as f64 * 100.0
    }

    /// Names of the items that failed, in input order.
    pub fn failed_names(&self) -> Vec<&str> {
        self.results
            .iter()
            .filter(|r| r.status == SyncStatus::Failed)
            .map(|r| r.secret_name.as_str())
            .collect()
    }
}
