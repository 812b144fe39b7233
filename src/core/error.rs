//! Engine-wide error taxonomy
//!
//! Every failure mode of the rotation and sync paths maps to one variant
//! here. Adapter failures propagate unmodified into a task's result or are
//! raised where no result type applies; the engine never silently discards
//! a failure.

use thiserror::Error;

/// Errors that can occur during rotation, synchronization, or mapping
#[derive(Debug, Error)]
pub enum EngineError {
    /// Secret absent from a queried store
    #[error("secret '{name}' not found in store '{store}'")]
    NotFound { name: String, store: String },

    /// Adapter-level failure, transient or not
    #[error("store '{store}' unavailable: {reason}")]
    StoreUnavailable { store: String, reason: String },

    /// Unrecognized or out-of-sequence rotation phase
    #[error("invalid rotation step: {step}")]
    InvalidStep { step: String },

    /// Candidate credential failed verification; rotation halts without
    /// promotion
    #[error("candidate credential for '{secret}' failed authentication test")]
    TestFailed { secret: String },

    /// Bidirectional sync found divergence with no safe automatic policy
    #[error("conflict on secret '{secret}': {reason}")]
    Conflict { secret: String, reason: String },

    /// Field collision during mapping. Non-fatal: the mapper resolves it by
    /// rule order and logs the dropped source key; this variant exists so
    /// the resolution can be surfaced in structured form.
    #[error(
        "ambiguous mapping to '{destination}': kept value from '{kept}', dropped '{dropped}'"
    )]
    MappingAmbiguous {
        destination: String,
        kept: String,
        dropped: String,
    },

    /// Rollback impossible: the backing store retains no prior version
    #[error("no prior version retained for secret '{secret}'")]
    NoPriorVersion { secret: String },

    /// Engine construction or generator configuration rejected
    #[error("invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    /// Audit/history export serialization failure
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Export sink I/O failure
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    /// Whether this error classifies as "secret absent from the queried
    /// store", which sync tasks report without an audit entry.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_classification() {
        let err = EngineError::NotFound {
            name: "db-admin".into(),
            store: "primary".into(),
        };
        assert!(err.is_not_found());

        let err = EngineError::StoreUnavailable {
            store: "primary".into(),
            reason: "connection refused".into(),
        };
        assert!(!err.is_not_found());
    }

    #[test]
    fn messages_name_the_secret() {
        let err = EngineError::TestFailed {
            secret: "prod-db".into(),
        };
        assert!(err.to_string().contains("prod-db"));
    }
}
