//! Rotation coordinator: protocol driver, scheduler, rollback.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::audit::{AuditEntry, AuditLog};
use crate::core::{EngineError, EngineResult, SecretString, WriteMode};
use crate::rotation::{
    CredentialGenerator, GeneratorConfig, PendingCredential, RotationEvent, RotationOutcome,
    RotationPhase, RotationResponse, RotationSchedule, RotationState, RotationStep,
};
use crate::sync::{ConflictPolicy, SyncDirection, SyncEngine, SyncStatus, SyncTask};
use crate::traits::{AuthProber, SecretStore, TargetUpdater};

/// Outcomes considered by [`RotationCoordinator::status`].
const HISTORY_WINDOW: usize = 5;

/// Rotation status summary for one secret.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RotationStatusReport {
    pub secret_name: String,
    /// `None` when the coordinator has never seen this secret
    pub phase: Option<RotationPhase>,
    /// Most recent outcomes, oldest first, at most [`HISTORY_WINDOW`]
    pub recent: Vec<RotationOutcome>,
    /// Successes over the recent window, as a percentage
    pub success_rate: f64,
    pub schedule: Option<RotationSchedule>,
}

/// Builder for [`RotationCoordinator`]. Store, updater and prober are
/// mandatory; everything else has a sensible default.
#[derive(Default)]
pub struct RotationCoordinatorBuilder {
    store: Option<Arc<dyn SecretStore>>,
    updater: Option<Arc<dyn TargetUpdater>>,
    prober: Option<Arc<dyn AuthProber>>,
    audit: Option<Arc<AuditLog>>,
    peer: Option<Arc<SyncEngine>>,
    generator_config: Option<GeneratorConfig>,
    password_field: Option<String>,
    actor: Option<String>,
}

impl RotationCoordinatorBuilder {
    pub fn store(mut self, store: Arc<dyn SecretStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn updater(mut self, updater: Arc<dyn TargetUpdater>) -> Self {
        self.updater = Some(updater);
        self
    }

    pub fn prober(mut self, prober: Arc<dyn AuthProber>) -> Self {
        self.prober = Some(prober);
        self
    }

    pub fn audit(mut self, audit: Arc<AuditLog>) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Sync engine used by [`RotationCoordinator::rotate_direct`] to push
    /// a freshly rotated credential to the peer store.
    pub fn peer(mut self, peer: Arc<SyncEngine>) -> Self {
        self.peer = Some(peer);
        self
    }

    pub fn generator_config(mut self, config: GeneratorConfig) -> Self {
        self.generator_config = Some(config);
        self
    }

    /// Field that receives the rotated value. Defaults to `password`.
    pub fn password_field(mut self, field: impl Into<String>) -> Self {
        self.password_field = Some(field.into());
        self
    }

    pub fn actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = Some(actor.into());
        self
    }

    pub fn build(self) -> EngineResult<RotationCoordinator> {
        let store = self.store.ok_or_else(|| EngineError::InvalidConfig {
            reason: "rotation coordinator requires a secret store".to_string(),
        })?;
        let updater = self.updater.ok_or_else(|| EngineError::InvalidConfig {
            reason: "rotation coordinator requires a target updater".to_string(),
        })?;
        let prober = self.prober.ok_or_else(|| EngineError::InvalidConfig {
            reason: "rotation coordinator requires an authentication prober".to_string(),
        })?;
        let generator = CredentialGenerator::new(self.generator_config.unwrap_or_default())?;

        Ok(RotationCoordinator {
            store,
            updater,
            prober,
            audit: self.audit.unwrap_or_default(),
            peer: self.peer,
            generator,
            password_field: self
                .password_field
                .unwrap_or_else(|| "password".to_string()),
            actor: self.actor.unwrap_or_else(|| "rotation-coordinator".to_string()),
            states: RwLock::new(HashMap::new()),
        })
    }
}

/// Drives rotation for secrets in one store.
///
/// All collaborators are injected; the coordinator never constructs its
/// own adapters. Rotation attempts for a given secret are strictly
/// sequential by contract; the coordinator itself never runs two phases
/// concurrently.
pub struct RotationCoordinator {
    store: Arc<dyn SecretStore>,
    updater: Arc<dyn TargetUpdater>,
    prober: Arc<dyn AuthProber>,
    audit: Arc<AuditLog>,
    peer: Option<Arc<SyncEngine>>,
    generator: CredentialGenerator,
    password_field: String,
    actor: String,
    states: RwLock<HashMap<String, RotationState>>,
}

impl RotationCoordinator {
    pub fn builder() -> RotationCoordinatorBuilder {
        RotationCoordinatorBuilder::default()
    }

    /// Execute one protocol step. Errors become a 500 response; the
    /// coordinator's state is never corrupted by a rejected step.
    pub async fn handle_event(&self, event: RotationEvent) -> RotationResponse {
        let outcome = match event.step {
            RotationStep::CreateSecret => self.create_secret(&event),
            RotationStep::SetSecret => self.set_secret(&event).await,
            RotationStep::TestSecret => self.test_secret(&event).await,
            RotationStep::FinishSecret => self.finish_secret(&event).await,
        };

        match outcome {
            Ok(response) => response,
            Err(err) => {
                error!(
                    secret = %event.secret_identifier,
                    step = %event.step,
                    error = %err,
                    "rotation step failed"
                );
                RotationResponse::error(err)
            }
        }
    }

    fn create_secret(&self, event: &RotationEvent) -> EngineResult<RotationResponse> {
        let name = event.secret_identifier.as_str();
        let mut states = self.states.write();
        let state = states
            .entry(name.to_string())
            .or_insert_with(|| RotationState::new(name));

        // Replay of the same request token is an idempotent no-op.
        if state.phase == RotationPhase::InProgress
            && state
                .pending
                .as_ref()
                .is_some_and(|p| p.request_token == event.request_token)
        {
            return Ok(RotationResponse::ok(
                "Secret created successfully",
                RotationStep::CreateSecret,
            ));
        }

        if state.phase.is_terminal() {
            state.reset_for_new_attempt();
        }
        state.transition(RotationPhase::InProgress)?;
        state.started_at.get_or_insert_with(Utc::now);
        state.pending = Some(PendingCredential {
            request_token: event.request_token.clone(),
            value: self.generator.generate(),
            created_at: Utc::now(),
        });

        info!(secret = %name, "pending credential created");
        Ok(RotationResponse::ok(
            "Secret created successfully",
            RotationStep::CreateSecret,
        ))
    }

    async fn set_secret(&self, event: &RotationEvent) -> EngineResult<RotationResponse> {
        let name = event.secret_identifier.as_str();
        let value = self.pending_value(name, RotationStep::SetSecret)?;

        // A failure here is reported but the phase does not advance, so
        // the caller may retry the step.
        if !self.updater.update(name, value.expose()).await? {
            return Err(EngineError::StoreUnavailable {
                store: "target-system".to_string(),
                reason: format!("target system rejected the new credential for '{name}'"),
            });
        }

        info!(secret = %name, "pending credential set in target system");
        Ok(RotationResponse::ok(
            "Secret set in target system",
            RotationStep::SetSecret,
        ))
    }

    async fn test_secret(&self, event: &RotationEvent) -> EngineResult<RotationResponse> {
        let name = event.secret_identifier.as_str();
        let value = self.pending_value(name, RotationStep::TestSecret)?;

        if self.prober.test(name, value.expose()).await? {
            info!(secret = %name, "pending credential verified");
            return Ok(RotationResponse::ok(
                "Secret tested successfully",
                RotationStep::TestSecret,
            ));
        }

        // The candidate does not authenticate. Halt in Failed; the pending
        // value is dropped and the active credential stays untouched.
        let err = EngineError::TestFailed {
            secret: name.to_string(),
        };
        {
            let mut states = self.states.write();
            let state = states.get_mut(name).ok_or_else(|| EngineError::InvalidStep {
                step: RotationStep::TestSecret.to_string(),
            })?;
            state.transition(RotationPhase::Failed)?;
            state.pending = None;
            let started = state.started_at.take().unwrap_or_else(Utc::now);
            state.history.push(outcome(
                name,
                RotationPhase::Failed,
                started,
                Utc::now(),
                "candidate credential failed verification",
                None,
                None,
                Some(err.to_string()),
            ));
        }
        self.audit.append(
            AuditEntry::new("rotation", name, "failed", self.actor.clone())
                .with_detail("step", RotationStep::TestSecret.to_string())
                .with_detail("error", err.to_string()),
        );
        Err(err)
    }

    async fn finish_secret(&self, event: &RotationEvent) -> EngineResult<RotationResponse> {
        let name = event.secret_identifier.as_str();
        let value = self.pending_value(name, RotationStep::FinishSecret)?;

        let (mut fields, old_version, mode) = match self.store.read(name).await {
            Ok(record) => (record.fields, Some(record.version), WriteMode::Update),
            Err(err) if err.is_not_found() => (Default::default(), None, WriteMode::Create),
            Err(err) => return Err(err),
        };
        fields.insert(self.password_field.clone(), value.expose().to_string());

        let new_version = self.store.write(name, &fields, mode).await?;
        let now = Utc::now();

        {
            let mut states = self.states.write();
            let state = states.get_mut(name).ok_or_else(|| EngineError::InvalidStep {
                step: RotationStep::FinishSecret.to_string(),
            })?;
            state.transition(RotationPhase::Success)?;
            let started = state.started_at.take().unwrap_or(now);
            state.pending = None;
            state.history.push(outcome(
                name,
                RotationPhase::Success,
                started,
                now,
                "Rotation finished successfully",
                old_version.clone(),
                Some(new_version.clone()),
                None,
            ));
            if let Some(schedule) = state.schedule.as_mut().filter(|s| s.enabled) {
                schedule.advance(now);
            }
        }

        self.audit.append(
            AuditEntry::new("rotation", name, "success", self.actor.clone())
                .with_detail("old_version", old_version.unwrap_or_default())
                .with_detail("new_version", new_version),
        );
        info!(secret = %name, "rotation finished");
        Ok(RotationResponse::ok(
            "Rotation finished successfully",
            RotationStep::FinishSecret,
        ))
    }

    /// One-call rotation for stores that rotate atomically. Failures are
    /// recorded in the returned outcome, never dropped.
    pub async fn rotate_direct(&self, secret: &str, notify_peer: bool) -> RotationOutcome {
        let started = Utc::now();

        {
            let mut states = self.states.write();
            let state = states
                .entry(secret.to_string())
                .or_insert_with(|| RotationState::new(secret));
            if state.phase.is_terminal() {
                state.reset_for_new_attempt();
            }
            if state.phase == RotationPhase::Pending {
                // Pending -> InProgress is always legal.
                let _ = state.transition(RotationPhase::InProgress);
            }
            state.started_at = Some(started);
        }

        let result = self.rotate_direct_inner(secret).await;
        let finished = Utc::now();

        let outcome = match result {
            Ok((old_version, new_version)) => outcome(
                secret,
                RotationPhase::Success,
                started,
                finished,
                "Rotation finished successfully",
                old_version,
                Some(new_version),
                None,
            ),
            Err(err) => outcome(
                secret,
                RotationPhase::Failed,
                started,
                finished,
                "rotation failed",
                None,
                None,
                Some(err.to_string()),
            ),
        };

        {
            let mut states = self.states.write();
            if let Some(state) = states.get_mut(secret) {
                let _ = state.transition(outcome.status);
                state.pending = None;
                state.started_at = None;
                state.history.push(outcome.clone());
                if outcome.status == RotationPhase::Success {
                    if let Some(schedule) = state.schedule.as_mut().filter(|s| s.enabled) {
                        schedule.advance(finished);
                    }
                }
            }
        }

        self.audit.append(
            AuditEntry::new(
                "rotation",
                secret,
                outcome.status.to_string(),
                self.actor.clone(),
            )
            .with_detail("direct", true)
            .with_detail("duration_seconds", outcome.duration_seconds),
        );

        if outcome.status == RotationPhase::Success && notify_peer {
            self.notify_peer(secret).await;
        }
        outcome
    }

    async fn rotate_direct_inner(&self, secret: &str) -> EngineResult<(Option<String>, String)> {
        let value = self.generator.generate();

        let (mut fields, old_version, mode) = match self.store.read(secret).await {
            Ok(record) => (record.fields, Some(record.version), WriteMode::Update),
            Err(err) if err.is_not_found() => (Default::default(), None, WriteMode::Create),
            Err(err) => return Err(err),
        };

        if !self.updater.update(secret, value.expose()).await? {
            return Err(EngineError::StoreUnavailable {
                store: "target-system".to_string(),
                reason: format!("target system rejected the new credential for '{secret}'"),
            });
        }
        if !self.prober.test(secret, value.expose()).await? {
            return Err(EngineError::TestFailed {
                secret: secret.to_string(),
            });
        }

        fields.insert(self.password_field.clone(), value.expose().to_string());
        let new_version = self.store.write(secret, &fields, mode).await?;
        Ok((old_version, new_version))
    }

    /// Best-effort one-way push of the rotated credential to the peer
    /// store. A failed push is logged, never fatal to the rotation.
    async fn notify_peer(&self, secret: &str) {
        let Some(peer) = &self.peer else {
            return;
        };
        let task = SyncTask::new(
            secret,
            SyncDirection::AToB,
            ConflictPolicy::OverwriteDestination,
        );
        let result = peer.sync_one(&task).await;
        if result.status != SyncStatus::Success {
            warn!(
                secret = %secret,
                status = %result.status,
                message = %result.message,
                "peer notification after rotation did not succeed"
            );
        }
    }

    /// Create or overwrite the rotation schedule for a secret.
    pub fn schedule(&self, secret: &str, interval_days: i64) -> RotationSchedule {
        let schedule = RotationSchedule::new(secret, interval_days);
        {
            let mut states = self.states.write();
            let state = states
                .entry(secret.to_string())
                .or_insert_with(|| RotationState::new(secret));
            state.schedule = Some(schedule.clone());
        }
        self.audit.append(
            AuditEntry::new("schedule", secret, "success", self.actor.clone())
                .with_detail("interval_days", interval_days),
        );
        info!(secret = %secret, interval_days, "rotation schedule set");
        schedule
    }

    /// Status summary: recent outcomes, success rate over that window,
    /// and the current schedule.
    pub fn status(&self, secret: &str) -> RotationStatusReport {
        let states = self.states.read();
        let Some(state) = states.get(secret) else {
            return RotationStatusReport {
                secret_name: secret.to_string(),
                phase: None,
                recent: Vec::new(),
                success_rate: 0.0,
                schedule: None,
            };
        };

        let recent: Vec<RotationOutcome> = state
            .history
            .iter()
            .rev()
            .take(HISTORY_WINDOW)
            .rev()
            .cloned()
            .collect();
        let success_rate = if recent.is_empty() {
            0.0
        } else {
            let successes = recent
                .iter()
                .filter(|o| o.status == RotationPhase::Success)
                .count();
            successes as f64 / recent.len() as f64 * 100.0
        };

        RotationStatusReport {
            secret_name: secret.to_string(),
            phase: Some(state.phase),
            recent,
            success_rate,
            schedule: state.schedule.clone(),
        }
    }

    /// Write the full outcome history for a secret to `writer` as an
    /// ordered JSON list, oldest first. Same sink contract as
    /// [`AuditLog::export_json`].
    pub fn export_history<W: std::io::Write>(&self, secret: &str, writer: W) -> EngineResult<()> {
        let states = self.states.read();
        let history: &[RotationOutcome] = states
            .get(secret)
            .map_or(&[], |state| state.history.as_slice());
        serde_json::to_writer_pretty(writer, history)?;
        Ok(())
    }

    /// Restore a prior credential version.
    ///
    /// Requires a finished rotation (`Failed` or `Success`). Without a
    /// `target_version` the version preceding the current one is restored.
    /// Stores that retain no history surface [`EngineError::NoPriorVersion`];
    /// rollback never appears to succeed when it cannot.
    pub async fn rollback(
        &self,
        secret: &str,
        target_version: Option<&str>,
    ) -> EngineResult<RotationOutcome> {
        let started = Utc::now();
        {
            let states = self.states.read();
            let phase = states.get(secret).map(|s| s.phase);
            if !matches!(phase, Some(RotationPhase::Failed | RotationPhase::Success)) {
                return Err(EngineError::Conflict {
                    secret: secret.to_string(),
                    reason: "rollback requires a finished rotation (failed or success)".to_string(),
                });
            }
        }

        let target = match target_version {
            Some(version) => version.to_string(),
            None => {
                let versions = self.store.list_versions(secret).await?;
                if versions.len() < 2 {
                    return Err(EngineError::NoPriorVersion {
                        secret: secret.to_string(),
                    });
                }
                versions[versions.len() - 2].clone()
            }
        };

        let prior = self.store.read_version(secret, &target).await?;
        let current_version = self.store.read(secret).await.map(|r| r.version).ok();
        let new_version = self
            .store
            .write(secret, &prior.fields, WriteMode::Update)
            .await?;
        let finished = Utc::now();

        let rollback_outcome = outcome(
            secret,
            RotationPhase::RolledBack,
            started,
            finished,
            format!("restored version {target}"),
            current_version,
            Some(new_version.clone()),
            None,
        );
        {
            let mut states = self.states.write();
            if let Some(state) = states.get_mut(secret) {
                state.transition(RotationPhase::RolledBack)?;
                state.history.push(rollback_outcome.clone());
            }
        }

        self.audit.append(
            AuditEntry::new("rollback", secret, "success", self.actor.clone())
                .with_detail("restored_version", target)
                .with_detail("new_version", new_version),
        );
        info!(secret = %secret, "rollback finished");
        Ok(rollback_outcome)
    }

    fn pending_value(&self, name: &str, step: RotationStep) -> EngineResult<SecretString> {
        let states = self.states.read();
        states
            .get(name)
            .filter(|state| state.phase == RotationPhase::InProgress)
            .and_then(|state| state.pending.as_ref())
            .map(|pending| pending.value.clone())
            .ok_or_else(|| EngineError::InvalidStep {
                step: step.to_string(),
            })
    }
}

#[allow(clippy::too_many_arguments)]
fn outcome(
    secret: &str,
    status: RotationPhase,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
    message: impl Into<String>,
    old_version: Option<String>,
    new_version: Option<String>,
    error: Option<String>,
) -> RotationOutcome {
    RotationOutcome {
        secret_name: secret.to_string(),
        status,
        started_at,
        finished_at,
        duration_seconds: (finished_at - started_at).num_milliseconds() as f64 / 1000.0,
        message: message.into(),
        old_version,
        new_version,
        error,
    }
}
