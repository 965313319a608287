// Engine constants (No magic values)

/// Message announced once when a phase raises the abort signal
pub const ABORT_MESSAGE: &str = "Command aborted";

/// Context key carrying the phase filter on `command.started`
pub const CONTEXT_ONLY: &str = "only";

/// Context key naming the phase on `task.*` notifications
pub const CONTEXT_PHASE: &str = "phase";

/// Context key carrying the phase duration on `task.completed`
pub const CONTEXT_ELAPSED_MS: &str = "elapsed_ms";
