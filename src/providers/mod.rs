//! Reference store adapters.
//!
//! Real deployments implement [`crate::traits::SecretStore`] against their
//! backing store. [`MemoryStore`] is the in-process reference adapter used
//! by tests and local runs: full version history, seeding helpers, a write
//! counter and fault injection. Instances are always explicit per run,
//! never process-global.

mod memory;

pub use memory::MemoryStore;
