// Notifier that writes every notification to the tracing pipeline
use async_trait::async_trait;
use tracing::{error, info};

use exchanger_core::domain::{Action, Notification};
use exchanger_core::port::Notifier;

/// Emits notifications as structured log events.
///
/// `task.error` goes out at ERROR; everything else at INFO. Routine
/// (silent-flagged) messages that reach this sink are tagged `routine = true`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl TracingNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Notifier for TracingNotifier {
    async fn notify(&self, notification: &Notification) {
        let context = serde_json::to_string(&notification.context).unwrap_or_default();

        match notification.action {
            Action::TaskError => error!(
                target: "exchanger::notify",
                run_id = %notification.run_id,
                action = %notification.action,
                context = %context,
                "{}",
                notification.message
            ),
            _ => info!(
                target: "exchanger::notify",
                run_id = %notification.run_id,
                action = %notification.action,
                routine = notification.silent,
                context = %context,
                "{}",
                notification.message
            ),
        }
    }
}
