// Phase Strategy Port
// Job-specific bodies of the three fixed phases

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{AbortSignal, DomainError, JobDefinition, Notification};
use crate::error::AppError;
use crate::port::{DeliveryError, Notifier};

/// Failure raised from inside a phase body.
///
/// Never escapes the engine: it is reported as a `task.error`
/// notification carrying the `Display` text.
#[derive(Error, Debug)]
pub enum PhaseError {
    #[error("{0}")]
    Failed(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Delivery(#[from] DeliveryError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    App(#[from] AppError),

    #[error("Phase panicked: {0}")]
    Panicked(String),
}

impl PhaseError {
    pub fn msg(message: impl std::fmt::Display) -> Self {
        PhaseError::Failed(message.to_string())
    }
}

/// Capabilities the engine lends to a phase body
pub struct PhaseContext<'a> {
    run_id: &'a str,
    job: &'a JobDefinition,
    synced_at: &'a str,
    abort: &'a AbortSignal,
    notifier: &'a dyn Notifier,
}

impl<'a> PhaseContext<'a> {
    pub fn new(
        run_id: &'a str,
        job: &'a JobDefinition,
        synced_at: &'a str,
        abort: &'a AbortSignal,
        notifier: &'a dyn Notifier,
    ) -> Self {
        Self {
            run_id,
            job,
            synced_at,
            abort,
            notifier,
        }
    }

    pub fn run_id(&self) -> &str {
        self.run_id
    }

    pub fn job(&self) -> &JobDefinition {
        self.job
    }

    /// `YYYY-MM-DD HH:MM:SS` marker set when the run started
    pub fn synced_at(&self) -> &str {
        self.synced_at
    }

    /// Abort the run: later phases will not start.
    ///
    /// The current phase keeps running. The engine announces the abort once
    /// this phase has closed. Returns `false` if the run was already aborted.
    pub fn stop(&self) -> bool {
        self.abort.raise()
    }

    pub fn is_stopped(&self) -> bool {
        self.abort.is_raised()
    }

    /// Routine progress comment, dropped in silent runs
    pub async fn comment(&self, message: impl Into<String>) {
        self.notifier
            .notify(&Notification::comment(self.run_id, message))
            .await;
    }

    /// Comment delivered even in silent runs
    pub async fn announce(&self, message: impl Into<String>) {
        self.notifier
            .notify(&Notification::new(
                self.run_id,
                crate::domain::Action::TaskComment,
                message,
            ))
            .await;
    }
}

/// Job-specific phase bodies.
///
/// `collect` is mandatory; `store` and `send` default to no-ops.
#[async_trait]
pub trait PhaseStrategy: Send {
    async fn collect(&mut self, ctx: &PhaseContext<'_>) -> Result<(), PhaseError>;

    async fn store(&mut self, _ctx: &PhaseContext<'_>) -> Result<(), PhaseError> {
        Ok(())
    }

    async fn send(&mut self, _ctx: &PhaseContext<'_>) -> Result<(), PhaseError> {
        Ok(())
    }
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::domain::Phase;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// Scripted behaviour of one phase
    #[derive(Debug, Clone)]
    pub enum MockBehavior {
        /// Return Ok
        Success,
        /// Return Err with message
        Fail(String),
        /// Panic with message (for isolation testing)
        Panic(String),
        /// Call stop(), then return Ok
        Stop,
        /// Call stop(), then return Err with message
        StopAndFail(String),
        /// Emit a routine comment, then return Ok
        Comment(String),
        /// Sleep, then return Ok
        Sleep(Duration),
    }

    /// Strategy whose phases follow a script; unscripted phases succeed.
    pub struct ScriptedStrategy {
        script: HashMap<Phase, MockBehavior>,
        calls: Arc<Mutex<Vec<Phase>>>,
    }

    impl ScriptedStrategy {
        pub fn new() -> Self {
            Self {
                script: HashMap::new(),
                calls: Arc::new(Mutex::new(Vec::new())),
            }
        }

        pub fn on(mut self, phase: Phase, behavior: MockBehavior) -> Self {
            self.script.insert(phase, behavior);
            self
        }

        /// Shared handle to the invocation log (survives moving the strategy)
        pub fn calls(&self) -> Arc<Mutex<Vec<Phase>>> {
            Arc::clone(&self.calls)
        }

        async fn play(&mut self, phase: Phase, ctx: &PhaseContext<'_>) -> Result<(), PhaseError> {
            self.calls.lock().unwrap().push(phase);

            let behavior = self
                .script
                .get(&phase)
                .cloned()
                .unwrap_or(MockBehavior::Success);

            match behavior {
                MockBehavior::Success => Ok(()),
                MockBehavior::Fail(msg) => Err(PhaseError::Failed(msg)),
                MockBehavior::Panic(msg) => {
                    panic!("{}", msg); // Actually panic for isolation testing
                }
                MockBehavior::Stop => {
                    ctx.stop();
                    Ok(())
                }
                MockBehavior::StopAndFail(msg) => {
                    ctx.stop();
                    Err(PhaseError::Failed(msg))
                }
                MockBehavior::Comment(msg) => {
                    ctx.comment(msg).await;
                    Ok(())
                }
                MockBehavior::Sleep(duration) => {
                    tokio::time::sleep(duration).await;
                    Ok(())
                }
            }
        }
    }

    impl Default for ScriptedStrategy {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl PhaseStrategy for ScriptedStrategy {
        async fn collect(&mut self, ctx: &PhaseContext<'_>) -> Result<(), PhaseError> {
            self.play(Phase::Collect, ctx).await
        }

        async fn store(&mut self, ctx: &PhaseContext<'_>) -> Result<(), PhaseError> {
            self.play(Phase::Store, ctx).await
        }

        async fn send(&mut self, ctx: &PhaseContext<'_>) -> Result<(), PhaseError> {
            self.play(Phase::Send, ctx).await
        }
    }

    /// Strategy that only supplies `collect`, leaving the default bodies
    #[derive(Default)]
    pub struct CollectOnlyStrategy {
        pub collected: usize,
    }

    #[async_trait]
    impl PhaseStrategy for CollectOnlyStrategy {
        async fn collect(&mut self, _ctx: &PhaseContext<'_>) -> Result<(), PhaseError> {
            self.collected += 1;
            Ok(())
        }
    }
}
