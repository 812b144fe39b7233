//! Rotation state machine and per-attempt bookkeeping.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::{EngineError, EngineResult, SecretString};
use crate::rotation::RotationSchedule;

/// Lifecycle phase of a rotation attempt.
///
/// Transitions only move forward through the protocol; `Success` and
/// `Failed` are terminal except for an explicit rollback, and
/// `RolledBack` is fully terminal; a new attempt starts from `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationPhase {
    Pending,
    InProgress,
    Success,
    Failed,
    RolledBack,
}

impl RotationPhase {
    /// Transition table. `InProgress → InProgress` covers the middle
    /// protocol steps (SetSecret, TestSecret) which do not change phase.
    pub fn can_transition(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::InProgress)
                | (Self::InProgress, Self::InProgress)
                | (Self::InProgress, Self::Success)
                | (Self::InProgress, Self::Failed)
                | (Self::Success, Self::RolledBack)
                | (Self::Failed, Self::RolledBack)
        )
    }

    /// Whether a new rotation attempt may start from this phase.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Success | Self::Failed | Self::RolledBack)
    }
}

impl std::fmt::Display for RotationPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Success => "success",
            Self::Failed => "failed",
            Self::RolledBack => "rolled_back",
        };
        f.write_str(s)
    }
}

/// Candidate credential produced by CreateSecret, held until FinishSecret
/// promotes it or the attempt fails.
#[derive(Debug, Clone)]
pub struct PendingCredential {
    /// Token of the request that created this candidate; a replayed
    /// CreateSecret with the same token is an idempotent no-op.
    pub request_token: String,

    /// The candidate value itself. Zeroized on drop.
    pub value: SecretString,

    /// When the candidate was generated.
    pub created_at: DateTime<Utc>,
}

/// Record of one finished rotation attempt (or rollback).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RotationOutcome {
    pub secret_name: String,
    pub status: RotationPhase,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_seconds: f64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Per-secret rotation bookkeeping held by the coordinator.
#[derive(Debug)]
pub struct RotationState {
    pub secret: String,
    pub phase: RotationPhase,
    /// Append-only, oldest first; survives across attempts.
    pub history: Vec<RotationOutcome>,
    pub schedule: Option<RotationSchedule>,
    pub pending: Option<PendingCredential>,
    pub started_at: Option<DateTime<Utc>>,
}

impl RotationState {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            phase: RotationPhase::Pending,
            history: Vec::new(),
            schedule: None,
            pending: None,
            started_at: None,
        }
    }

    /// Apply a phase transition, rejecting any not in the table.
    pub fn transition(&mut self, next: RotationPhase) -> EngineResult<()> {
        if !self.phase.can_transition(next) {
            return Err(EngineError::Conflict {
                secret: self.secret.clone(),
                reason: format!("illegal rotation phase transition {} -> {next}", self.phase),
            });
        }
        self.phase = next;
        Ok(())
    }

    /// Reset for a fresh attempt after a terminal phase. History and
    /// schedule are kept.
    pub fn reset_for_new_attempt(&mut self) {
        self.phase = RotationPhase::Pending;
        self.pending = None;
        self.started_at = None;
    }
}
