//! Secret synchronization between two stores.
//!
//! The [`SyncEngine`] reconciles one secret (or a batch, strictly
//! sequentially) between Store A and Store B, translating field names
//! through a [`crate::mapping::FieldMapper`] per direction. Conflict
//! handling is explicit: nothing is overwritten unless the chosen
//! [`ConflictPolicy`] decides it, and dry-run is guaranteed read-only.

mod engine;
mod task;

pub use engine::{SecretComparison, SyncEngine};
pub use task::{ConflictPolicy, SyncDirection, SyncReport, SyncResult, SyncStatus, SyncTask};
