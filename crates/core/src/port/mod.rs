// Port Layer - Interfaces for external dependencies

pub mod artifact_store;
pub mod delivery;
pub mod id_provider; // For deterministic testing
pub mod notifier;
pub mod phase_strategy;
pub mod sync_marker;
pub mod time_provider;

// Re-exports
pub use artifact_store::{public_url, ArtifactStore};
pub use delivery::{Delivery, DeliveryError, DeliveryReceipt, DeliveryRequest};
pub use id_provider::IdProvider;
pub use notifier::{FanoutNotifier, Notifier, SilenceGate};
pub use phase_strategy::{PhaseContext, PhaseError, PhaseStrategy};
pub use sync_marker::{GlobalSyncMarker, ProcessSyncMarker, SyncMarker};
pub use time_provider::TimeProvider;
