//! Rotation collaborators: target-system updater and authentication prober.
//!
//! Both are invoked only during the SetSecret and TestSecret phases of the
//! four-phase rotation protocol.

use async_trait::async_trait;

use crate::core::EngineResult;

/// Pushes a candidate credential into the system that actually consumes it
/// (database, API, service account).
#[async_trait]
pub trait TargetUpdater: Send + Sync {
    /// Apply `value` as the credential for `name` in the target system.
    ///
    /// Returns `Ok(false)` when the target rejected the update without an
    /// adapter-level error.
    async fn update(&self, name: &str, value: &str) -> EngineResult<bool>;
}

/// Verifies that a candidate credential actually authenticates against the
/// target system before it is promoted.
#[async_trait]
pub trait AuthProber: Send + Sync {
    /// Attempt authentication with `value`; `Ok(false)` means the candidate
    /// does not work and must never be promoted.
    async fn test(&self, name: &str, value: &str) -> EngineResult<bool>;
}
