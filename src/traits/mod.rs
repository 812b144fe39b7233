//! Core traits: store adapters and rotation collaborators

mod store;
mod target;

pub use store::SecretStore;
pub use target::{AuthProber, TargetUpdater};
