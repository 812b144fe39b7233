//! Credsync - credential rotation and synchronization engine
//!
//! Keeps credentials consistent between two secret stores and rotates them
//! safely through a four-phase protocol.
//!
//! # Features
//!
//! - **Phased rotation** - CreateSecret → SetSecret → TestSecret → FinishSecret,
//!   compatible with external phased-rotation callers
//! - **Two-store sync** - directional and bidirectional, with explicit
//!   conflict policies and guaranteed read-only dry runs
//! - **Field mapping** - deterministic key translation between store
//!   naming conventions
//! - **Audit trail** - append-only log of every completed operation
//! - **Health scoring** - staleness/compliance score per secret
#![deny(unsafe_code)]
#![forbid(unsafe_code)]

/// Append-only audit log and export
pub mod audit;
/// Core types and the error taxonomy
pub mod core;
/// Health scoring for secret metadata
pub mod health;
/// Field mapping and template recommendation
pub mod mapping;
/// Store adapter implementations
pub mod providers;
/// Four-phase rotation: coordinator, schedule, generator
pub mod rotation;
/// Two-store synchronization engine
pub mod sync;
/// Store adapter and rotation collaborator traits
pub mod traits;
/// Small helpers (secret wrapper)
pub mod utils;

// ── Root re-exports ─────────────────────────────────────────────────────────
// Commonly-used types available directly as `credsync::TypeName`.

// Core types & errors
pub use crate::core::{
    EngineError, EngineResult, SecretMetadata, SecretRecord, SecretString, WriteMode,
};

// Traits
pub use crate::traits::{AuthProber, SecretStore, TargetUpdater};

// Rotation
pub use crate::rotation::{
    RotationCoordinator, RotationEvent, RotationOutcome, RotationPhase, RotationResponse,
    RotationSchedule, RotationStep,
};

// Sync
pub use crate::sync::{ConflictPolicy, SyncDirection, SyncEngine, SyncResult, SyncStatus, SyncTask};

/// Commonly used types and traits
pub mod prelude {
    // Core types
    pub use crate::core::{
        EngineError, EngineResult, SecretMetadata, SecretRecord, SecretString, WriteMode,
    };

    // Traits
    pub use crate::traits::{AuthProber, SecretStore, TargetUpdater};

    // Rotation
    pub use crate::rotation::{
        CredentialGenerator, GeneratorConfig, RotationCoordinator, RotationEvent,
        RotationOutcome, RotationPhase, RotationResponse, RotationSchedule, RotationStep,
    };

    // Sync
    pub use crate::sync::{
        ConflictPolicy, SyncDirection, SyncEngine, SyncReport, SyncResult, SyncStatus, SyncTask,
    };

    // Mapping
    pub use crate::mapping::{FieldMapper, MappingRule, SecretCategory, TemplateRecommender};

    // Audit & health
    pub use crate::audit::{AuditEntry, AuditLog};
    pub use crate::health::{HealthScore, HealthStatus};

    // Reference provider
    pub use crate::providers::MemoryStore;
}
