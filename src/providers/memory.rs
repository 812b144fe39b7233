//! In-memory [`SecretStore`] with version history and fault injection.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use uuid::Uuid;

use crate::core::{EngineError, EngineResult, SecretMetadata, SecretRecord, WriteMode};
use crate::traits::SecretStore;

/// Explicit, per-run in-memory store.
///
/// Retains every written version (oldest first), so rollback works against
/// it. Test hooks:
///
/// - [`MemoryStore::seed`] / [`MemoryStore::seed_at`] insert versions
///   without counting as engine writes,
/// - [`MemoryStore::write_count`] counts only [`SecretStore::write`] calls
///   (dry-run verification),
/// - [`MemoryStore::fail_next`] makes the next adapter call fail with
///   [`EngineError::StoreUnavailable`].
#[derive(Debug)]
pub struct MemoryStore {
    id: String,
    records: RwLock<HashMap<String, Vec<SecretRecord>>>,
    metadata: RwLock<HashMap<String, SecretMetadata>>,
    write_count: AtomicUsize,
    fail_next: Mutex<Option<String>>,
}

impl MemoryStore {
    /// Empty store with the given identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            records: RwLock::new(HashMap::new()),
            metadata: RwLock::new(HashMap::new()),
            write_count: AtomicUsize::new(0),
            fail_next: Mutex::new(None),
        }
    }

    /// Insert a version timestamped now. Returns the version identifier.
    pub fn seed(&self, name: &str, fields: BTreeMap<String, String>) -> String {
        self.seed_at(name, fields, Utc::now())
    }

    /// Insert a version with an explicit timestamp (conflict-policy tests
    /// need controlled `last_modified` ordering).
    pub fn seed_at(
        &self,
        name: &str,
        fields: BTreeMap<String, String>,
        last_modified: DateTime<Utc>,
    ) -> String {
        let version = Uuid::new_v4().to_string();
        let record = SecretRecord {
            name: name.to_string(),
            fields,
            version: version.clone(),
            last_modified,
            store: self.id.clone(),
        };
        self.records
            .write()
            .entry(name.to_string())
            .or_default()
            .push(record);
        version
    }

    /// Attach metadata returned by [`SecretStore::list`] for this secret,
    /// replacing the derived default.
    pub fn annotate(&self, metadata: SecretMetadata) {
        self.metadata
            .write()
            .insert(metadata.name.clone(), metadata);
    }

    /// Number of [`SecretStore::write`] calls observed (seeding excluded).
    pub fn write_count(&self) -> usize {
        self.write_count.load(Ordering::SeqCst)
    }

    /// Make the next adapter call fail with `StoreUnavailable(reason)`.
    pub fn fail_next(&self, reason: impl Into<String>) {
        *self.fail_next.lock() = Some(reason.into());
    }

    fn check_fault(&self) -> EngineResult<()> {
        if let Some(reason) = self.fail_next.lock().take() {
            return Err(EngineError::StoreUnavailable {
                store: self.id.clone(),
                reason,
            });
        }
        Ok(())
    }

    fn not_found(&self, name: &str) -> EngineError {
        EngineError::NotFound {
            name: name.to_string(),
            store: self.id.clone(),
        }
    }
}

#[async_trait]
impl SecretStore for MemoryStore {
    fn store_id(&self) -> &str {
        &self.id
    }

    async fn read(&self, name: &str) -> EngineResult<SecretRecord> {
        self.check_fault()?;
        self.records
            .read()
            .get(name)
            .and_then(|versions| versions.last())
            .cloned()
            .ok_or_else(|| self.not_found(name))
    }

    async fn write(
        &self,
        name: &str,
        fields: &BTreeMap<String, String>,
        mode: WriteMode,
    ) -> EngineResult<String> {
        self.check_fault()?;

        let mut records = self.records.write();
        let exists = records.get(name).is_some_and(|v| !v.is_empty());
        match mode {
            WriteMode::Create if exists => {
                return Err(EngineError::Conflict {
                    secret: name.to_string(),
                    reason: format!("secret already exists in store '{}'", self.id),
                });
            }
            WriteMode::Update if !exists => return Err(self.not_found(name)),
            _ => {}
        }

        let version = Uuid::new_v4().to_string();
        records.entry(name.to_string()).or_default().push(SecretRecord {
            name: name.to_string(),
            fields: fields.clone(),
            version: version.clone(),
            last_modified: Utc::now(),
            store: self.id.clone(),
        });
        self.write_count.fetch_add(1, Ordering::SeqCst);
        Ok(version)
    }

    async fn exists(&self, name: &str) -> EngineResult<bool> {
        self.check_fault()?;
        Ok(self
            .records
            .read()
            .get(name)
            .is_some_and(|versions| !versions.is_empty()))
    }

    async fn delete(&self, name: &str) -> EngineResult<()> {
        self.check_fault()?;
        if self.records.write().remove(name).is_none() {
            return Err(self.not_found(name));
        }
        self.metadata.write().remove(name);
        Ok(())
    }

    async fn list(&self) -> EngineResult<Vec<SecretMetadata>> {
        self.check_fault()?;
        let overlays = self.metadata.read();
        let mut out: Vec<SecretMetadata> = self
            .records
            .read()
            .iter()
            .filter_map(|(name, versions)| {
                let current = versions.last()?;
                Some(overlays.get(name).cloned().unwrap_or_else(|| {
                    let mut meta = SecretMetadata::new(name.clone())
                        .with_last_changed(current.last_modified);
                    meta.version = current.version.clone();
                    meta
                }))
            })
            .collect();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(out)
    }

    async fn list_versions(&self, name: &str) -> EngineResult<Vec<String>> {
        self.check_fault()?;
        self.records
            .read()
            .get(name)
            .map(|versions| versions.iter().map(|r| r.version.clone()).collect())
            .ok_or_else(|| self.not_found(name))
    }

    async fn read_version(&self, name: &str, version: &str) -> EngineResult<SecretRecord> {
        self.check_fault()?;
        let records = self.records.read();
        let versions = records.get(name).ok_or_else(|| self.not_found(name))?;
        versions
            .iter()
            .find(|r| r.version == version)
            .cloned()
            .ok_or_else(|| EngineError::NoPriorVersion {
                secret: name.to_string(),
            })
    }
}
