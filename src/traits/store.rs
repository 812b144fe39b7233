//! Store adapter contract.
//!
//! A [`SecretStore`] is implemented once per backing store (Vault,
//! cloud secret manager, PAM vault, ...) and consumed by both the
//! [`crate::sync::SyncEngine`] and the
//! [`crate::rotation::RotationCoordinator`]. The engine treats adapter
//! calls as opaque operations that either return or fail; timeouts,
//! authentication and retries are adapter responsibilities.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::core::{EngineError, EngineResult, SecretMetadata, SecretRecord, WriteMode};

/// Contract every backing store implements.
///
/// Adapters are injected at engine construction time; the engine never
/// constructs its own collaborators.
///
/// # Example
///
/// ```rust,ignore
/// use credsync::prelude::*;
/// use std::sync::Arc;
///
/// let primary: Arc<dyn SecretStore> = Arc::new(MemoryStore::new("vault"));
/// let peer: Arc<dyn SecretStore> = Arc::new(MemoryStore::new("cloud"));
/// let engine = SyncEngine::new(primary, peer, Arc::new(AuditLog::new()));
/// ```
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Stable identifier of this store, used in results, errors and audit
    /// entries.
    fn store_id(&self) -> &str;

    /// Read the current version of a secret.
    ///
    /// Absence is an error: [`EngineError::NotFound`].
    async fn read(&self, name: &str) -> EngineResult<SecretRecord>;

    /// Write a secret and return the new version identifier.
    ///
    /// With [`WriteMode::Create`] the secret must not exist; with
    /// [`WriteMode::Update`] it must. Stores with version history retain
    /// the previous version.
    async fn write(
        &self,
        name: &str,
        fields: &BTreeMap<String, String>,
        mode: WriteMode,
    ) -> EngineResult<String>;

    /// Whether a secret exists.
    async fn exists(&self, name: &str) -> EngineResult<bool>;

    /// Delete a secret (and any retained versions).
    async fn delete(&self, name: &str) -> EngineResult<()>;

    /// List metadata for all secrets in the store.
    async fn list(&self) -> EngineResult<Vec<SecretMetadata>>;

    /// Version identifiers retained for a secret, oldest first.
    ///
    /// Stores without version history return an empty list by default.
    async fn list_versions(&self, name: &str) -> EngineResult<Vec<String>> {
        let _ = name;
        Ok(Vec::new())
    }

    /// Read a specific retained version.
    ///
    /// Stores without version history surface
    /// [`EngineError::NoPriorVersion`] by default, so rollback can
    /// never appear to succeed against a store that cannot honor it.
    async fn read_version(&self, name: &str, version: &str) -> EngineResult<SecretRecord> {
        let _ = version;
        Err(EngineError::NoPriorVersion {
            secret: name.to_string(),
        })
    }
}
