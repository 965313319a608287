// Notifier Port
// Observability must never crash a job: implementations swallow their own failures.

use crate::domain::Notification;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::trace;

/// Sink for lifecycle and progress notifications
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver a notification. Infallible by contract.
    async fn notify(&self, notification: &Notification);
}

/// Per-run silence policy wrapped around a sink.
///
/// Drops a notification iff the run is silent and the notification is
/// flagged silent; errors and lifecycle messages are never flagged.
pub struct SilenceGate {
    inner: Arc<dyn Notifier>,
    silent: bool,
}

impl SilenceGate {
    pub fn new(inner: Arc<dyn Notifier>, silent: bool) -> Self {
        Self { inner, silent }
    }

    pub fn is_silent(&self) -> bool {
        self.silent
    }

    pub fn admits(&self, notification: &Notification) -> bool {
        !(self.silent && notification.silent)
    }
}

#[async_trait]
impl Notifier for SilenceGate {
    async fn notify(&self, notification: &Notification) {
        if !self.admits(notification) {
            trace!(action = %notification.action, "Notification suppressed (silent run)");
            return;
        }
        self.inner.notify(notification).await;
    }
}

/// Delivers every notification to each sink, in registration order
#[derive(Default)]
pub struct FanoutNotifier {
    sinks: Vec<Arc<dyn Notifier>>,
}

impl FanoutNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: Arc<dyn Notifier>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

#[async_trait]
impl Notifier for FanoutNotifier {
    async fn notify(&self, notification: &Notification) {
        for sink in &self.sinks {
            sink.notify(notification).await;
        }
    }
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::domain::Action;
    use std::sync::Mutex;

    /// Records every delivered notification
    #[derive(Default)]
    pub struct RecordingNotifier {
        received: Mutex<Vec<Notification>>,
    }

    impl RecordingNotifier {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn notifications(&self) -> Vec<Notification> {
            self.received.lock().unwrap().clone()
        }

        pub fn actions(&self) -> Vec<Action> {
            self.notifications().iter().map(|n| n.action).collect()
        }

        pub fn messages(&self) -> Vec<String> {
            self.notifications()
                .into_iter()
                .map(|n| n.message)
                .collect()
        }

        pub fn count(&self, action: Action) -> usize {
            self.notifications()
                .iter()
                .filter(|n| n.action == action)
                .count()
        }
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn notify(&self, notification: &Notification) {
            self.received.lock().unwrap().push(notification.clone());
        }
    }
}
