//! Core types for the rotation and synchronization engine

mod error;
mod record;

pub use error::{EngineError, EngineResult};
pub use record::{SecretMetadata, SecretRecord, WriteMode};

// Re-exports from utils
pub use crate::utils::SecretString;
