// Domain Layer - Pure business logic and entities

pub mod artifact;
pub mod error;
pub mod job;
pub mod notification;
pub mod phase;
pub mod run;
pub mod snapshot;

// Re-exports
pub use artifact::{ArtifactLocator, Environment};
pub use error::DomainError;
pub use job::JobDefinition;
pub use notification::{Action, Notification, NotificationContext};
pub use phase::{Phase, PhaseOutcome, PhaseResult, PhaseSelector};
pub use run::{AbortSignal, JobOutcome, JobRun, RunId, RunState};
pub use snapshot::Snapshot;
