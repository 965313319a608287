// Exchanger Infrastructure - System Adapters
// Implements: Notifier (tracing), ArtifactStore (local filesystem), Delivery (HTTP)

pub mod http_delivery;
pub mod local_artifact_store;
pub mod tracing_notifier;

pub use http_delivery::{HttpDelivery, DEFAULT_DELIVERY_TIMEOUT};
pub use local_artifact_store::LocalArtifactStore;
pub use tracing_notifier::TracingNotifier;
