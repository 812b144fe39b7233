//! Four-phase credential rotation.
//!
//! Rotation follows the external phased contract
//! (CreateSecret → SetSecret → TestSecret → FinishSecret) driven through
//! [`RotationCoordinator::handle_event`], with a one-call direct path for
//! stores that rotate atomically, plus scheduling, status reporting and
//! best-effort rollback.
//!
//! Phase progression is an explicit state machine
//! ([`RotationPhase::can_transition`]); illegal sequences are rejected,
//! never silently accepted. The candidate credential generated in
//! CreateSecret stays *pending*; the active credential is untouched until
//! FinishSecret promotes it, and a failed TestSecret guarantees it never
//! is.

mod coordinator;
mod event;
mod generator;
mod schedule;
mod state;

pub use coordinator::{RotationCoordinator, RotationCoordinatorBuilder, RotationStatusReport};
pub use event::{ResponseBody, RotationEvent, RotationResponse, RotationStep};
pub use generator::{CredentialGenerator, GeneratorConfig};
pub use schedule::RotationSchedule;
pub use state::{PendingCredential, RotationOutcome, RotationPhase, RotationState};
