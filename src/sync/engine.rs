//! The sync engine proper.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use crate::audit::{AuditEntry, AuditLog};
use crate::core::{EngineError, EngineResult, WriteMode};
use crate::mapping::FieldMapper;
use crate::sync::{ConflictPolicy, SyncDirection, SyncReport, SyncResult, SyncStatus, SyncTask};
use crate::traits::SecretStore;

/// Comparison of one secret across both stores, from [`SyncEngine::status`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretComparison {
    pub secret_name: String,
    pub in_a: bool,
    pub in_b: bool,
    /// Both present and mapped payloads deep-equal
    pub in_sync: bool,
    /// Per-field differences: value mismatches and one-sided fields
    pub conflicts: Vec<String>,
}

/// Reconciles secrets between Store A and Store B.
///
/// Adapters, mappers and the audit log are injected at construction.
/// Every terminal outcome is audited except a pure dry-run skip and a
/// missing-source failure (nothing happened, nothing to attest).
pub struct SyncEngine {
    store_a: Arc<dyn SecretStore>,
    store_b: Arc<dyn SecretStore>,
    mapper_a_to_b: FieldMapper,
    mapper_b_to_a: FieldMapper,
    audit: Arc<AuditLog>,
    actor: String,
}

impl SyncEngine {
    /// Engine with identity field mapping in both directions.
    pub fn new(
        store_a: Arc<dyn SecretStore>,
        store_b: Arc<dyn SecretStore>,
        audit: Arc<AuditLog>,
    ) -> Self {
        Self {
            store_a,
            store_b,
            mapper_a_to_b: FieldMapper::identity(),
            mapper_b_to_a: FieldMapper::identity(),
            audit,
            actor: "sync-engine".to_string(),
        }
    }

    /// Set per-direction field mappers.
    pub fn with_field_mappers(mut self, a_to_b: FieldMapper, b_to_a: FieldMapper) -> Self {
        self.mapper_a_to_b = a_to_b;
        self.mapper_b_to_a = b_to_a;
        self
    }

    /// Set the actor recorded in audit entries.
    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = actor.into();
        self
    }

    /// Synchronize one secret. Adapter failures land in the result; the
    /// call itself does not fail.
    pub async fn sync_one(&self, task: &SyncTask) -> SyncResult {
        let result = match task.direction {
            SyncDirection::AToB | SyncDirection::BToA => {
                self.sync_directional(task, task.direction).await
            }
            SyncDirection::Bidirectional => self.sync_bidirectional(task).await,
        };

        info!(
            secret = %result.secret_name,
            direction = %result.direction,
            status = %result.status,
            "sync finished"
        );
        result
    }

    /// Synchronize a batch strictly sequentially. One item's failure does
    /// not abort the remainder; results preserve input order.
    pub async fn sync_batch(
        &self,
        names: &[&str],
        direction: SyncDirection,
        policy: ConflictPolicy,
        dry_run: bool,
    ) -> SyncReport {
        let started_at = Utc::now();
        let mut results = Vec::with_capacity(names.len());

        for name in names {
            let mut task = SyncTask::new(*name, direction, policy);
            task.dry_run = dry_run;
            results.push(self.sync_one(&task).await);
        }

        let report = SyncReport {
            direction,
            dry_run,
            started_at,
            finished_at: Utc::now(),
            results,
        };
        info!(
            total = report.total(),
            succeeded = report.count(SyncStatus::Success),
            failed = report.count(SyncStatus::Failed),
            skipped = report.count(SyncStatus::Skipped),
            conflicts = report.count(SyncStatus::Conflict),
            "sync batch finished"
        );
        report
    }

    /// Compare one secret across both stores without mutating anything.
    pub async fn status(&self, name: &str) -> EngineResult<SecretComparison> {
        let in_a = self.store_a.exists(name).await?;
        let in_b = self.store_b.exists(name).await?;

        if !(in_a && in_b) {
            let mut conflicts = Vec::new();
            if in_a != in_b {
                let present = if in_a { "A" } else { "B" };
                conflicts.push(format!("present only in store {present}"));
            }
            return Ok(SecretComparison {
                secret_name: name.to_string(),
                in_a,
                in_b,
                in_sync: false,
                conflicts,
            });
        }

        let record_a = self.store_a.read(name).await?;
        let record_b = self.store_b.read(name).await?;
        let (mapped_a, _) = self.mapper_a_to_b.map_fields(&record_a.fields);

        let mut conflicts = Vec::new();
        for (key, value) in &mapped_a {
            match record_b.fields.get(key) {
                Some(other) if other == value => {}
                Some(_) => conflicts.push(format!("field '{key}' differs")),
                None => conflicts.push(format!("field '{key}' only in store A")),
            }
        }
        for key in record_b.fields.keys() {
            if !mapped_a.contains_key(key) {
                conflicts.push(format!("field '{key}' only in store B"));
            }
        }

        Ok(SecretComparison {
            secret_name: name.to_string(),
            in_a,
            in_b,
            in_sync: conflicts.is_empty(),
            conflicts,
        })
    }

    fn endpoints(
        &self,
        direction: SyncDirection,
    ) -> (&Arc<dyn SecretStore>, &Arc<dyn SecretStore>, &FieldMapper) {
        match direction {
            SyncDirection::BToA => (&self.store_b, &self.store_a, &self.mapper_b_to_a),
            _ => (&self.store_a, &self.store_b, &self.mapper_a_to_b),
        }
    }

    async fn sync_directional(&self, task: &SyncTask, direction: SyncDirection) -> SyncResult {
        let name = task.secret_name.as_str();
        let (source, dest, mapper) = self.endpoints(direction);

        let record = match source.read(name).await {
            Ok(record) => record,
            // Early validation failure: nothing happened, no audit entry.
            Err(err @ EngineError::NotFound { .. }) => {
                return SyncResult::new(name, direction, SyncStatus::Failed, err.to_string());
            }
            Err(err) => {
                return self
                    .finish(
                        SyncResult::new(name, direction, SyncStatus::Failed, err.to_string()),
                        task.dry_run,
                    );
            }
        };

        let dest_exists = match dest.exists(name).await {
            Ok(exists) => exists,
            Err(err) => {
                return self
                    .finish(
                        SyncResult::new(name, direction, SyncStatus::Failed, err.to_string()),
                        task.dry_run,
                    );
            }
        };

        if task.dry_run {
            let action = if dest_exists { "update" } else { "create" };
            return SyncResult::new(
                name,
                direction,
                SyncStatus::Skipped,
                format!("dry run: would {action} '{name}' in store '{}'", dest.store_id()),
            );
        }

        if dest_exists && task.policy == ConflictPolicy::Skip {
            return self.finish(
                SyncResult::new(
                    name,
                    direction,
                    SyncStatus::Skipped,
                    format!("destination '{}' already holds the secret", dest.store_id()),
                ),
                false,
            );
        }

        let (mapped, skipped) = mapper.map_fields(&record.fields);
        if !skipped.is_empty() {
            warn!(
                secret = %name,
                skipped = ?skipped,
                "fields without a canonical destination were carried over normalized"
            );
        }

        let mode = if dest_exists {
            WriteMode::Update
        } else {
            WriteMode::Create
        };
        match dest.write(name, &mapped, mode).await {
            Ok(dest_version) => self.finish(
                SyncResult::new(
                    name,
                    direction,
                    SyncStatus::Success,
                    format!("synced to store '{}'", dest.store_id()),
                )
                .with_versions(record.version.clone(), dest_version),
                false,
            ),
            Err(err) => self.finish(
                SyncResult::new(name, direction, SyncStatus::Failed, err.to_string()),
                false,
            ),
        }
    }

    async fn sync_bidirectional(&self, task: &SyncTask) -> SyncResult {
        let name = task.secret_name.as_str();

        let (in_a, in_b) = match (
            self.store_a.exists(name).await,
            self.store_b.exists(name).await,
        ) {
            (Ok(a), Ok(b)) => (a, b),
            (Err(err), _) | (_, Err(err)) => {
                return self.finish(
                    SyncResult::new(
                        name,
                        SyncDirection::Bidirectional,
                        SyncStatus::Failed,
                        err.to_string(),
                    ),
                    task.dry_run,
                );
            }
        };

        match (in_a, in_b) {
            // Absent everywhere: same class as a missing source, no audit.
            (false, false) => SyncResult::new(
                name,
                SyncDirection::Bidirectional,
                SyncStatus::Failed,
                format!("secret '{name}' absent from both stores"),
            ),
            (true, false) => self.sync_directional(task, SyncDirection::AToB).await,
            (false, true) => self.sync_directional(task, SyncDirection::BToA).await,
            (true, true) => self.resolve_both_present(task).await,
        }
    }

    async fn resolve_both_present(&self, task: &SyncTask) -> SyncResult {
        let name = task.secret_name.as_str();

        if task.policy != ConflictPolicy::UseNewest {
            return self.finish(
                SyncResult::new(
                    name,
                    SyncDirection::Bidirectional,
                    SyncStatus::Conflict,
                    format!(
                        "secret '{name}' present in both stores and policy {:?} \
                         does not authorize an overwrite",
                        task.policy
                    ),
                ),
                task.dry_run,
            );
        }

        let (record_a, record_b) = match (
            self.store_a.read(name).await,
            self.store_b.read(name).await,
        ) {
            (Ok(a), Ok(b)) => (a, b),
            (Err(err), _) | (_, Err(err)) => {
                return self.finish(
                    SyncResult::new(
                        name,
                        SyncDirection::Bidirectional,
                        SyncStatus::Failed,
                        err.to_string(),
                    ),
                    task.dry_run,
                );
            }
        };

        // Newer side wins; an exact tie deterministically favors A.
        let winner = if record_a.last_modified >= record_b.last_modified {
            SyncDirection::AToB
        } else {
            SyncDirection::BToA
        };

        // A decision was made, so the loser is overwritten, never skipped.
        let mut push = SyncTask::new(name, winner, ConflictPolicy::OverwriteDestination);
        push.dry_run = task.dry_run;
        let mut result = self.sync_directional(&push, winner).await;
        result.direction = SyncDirection::Bidirectional;
        result
    }

    fn finish(&self, result: SyncResult, dry_run: bool) -> SyncResult {
        // Dry runs leave no audit trail: nothing was mutated.
        if dry_run {
            return result;
        }
        let mut entry = AuditEntry::new(
            "sync",
            result.secret_name.clone(),
            result.status.to_string(),
            self.actor.clone(),
        )
        .with_direction(result.direction.to_string())
        .with_detail("message", result.message.clone());
        if let Some(source_version) = &result.source_version {
            entry = entry.with_detail("source_version", source_version.clone());
        }
        if let Some(dest_version) = &result.dest_version {
            entry = entry.with_detail("dest_version", dest_version.clone());
        }
        self.audit.append(entry);
        result
    }
}
