// Job Run Domain Model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};

use super::error::{DomainError, Result};
use super::phase::{Phase, PhaseOutcome, PhaseResult, PhaseSelector};

/// Run identifier (UUID v4 in production)
pub type RunId = String;

/// Cooperative abort flag.
///
/// Only ever moves from `false` to `true`; there is no way to clear it.
#[derive(Debug, Default)]
pub struct AbortSignal {
    raised: AtomicBool,
}

impl AbortSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the signal. Returns `true` only for the call that flipped it.
    pub fn raise(&self) -> bool {
        self.raised
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    pub fn is_raised(&self) -> bool {
        self.raised.load(Ordering::SeqCst)
    }
}

/// Lifecycle state of a single run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunState {
    NotStarted,
    Running(Phase),
    Skipped(Phase),
    Completed,
}

impl RunState {
    /// Position of the state along the fixed lifecycle
    fn rank(&self) -> u8 {
        match self {
            RunState::NotStarted => 0,
            RunState::Running(phase) | RunState::Skipped(phase) => match phase {
                Phase::Collect => 1,
                Phase::Store => 2,
                Phase::Send => 3,
            },
            RunState::Completed => 4,
        }
    }
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunState::NotStarted => write!(f, "NOT_STARTED"),
            RunState::Running(phase) => write!(f, "RUNNING_{}", phase.as_str().to_uppercase()),
            RunState::Skipped(phase) => write!(f, "SKIPPED_{}", phase.as_str().to_uppercase()),
            RunState::Completed => write!(f, "COMPLETED"),
        }
    }
}

/// State of one invocation of the engine.
///
/// Owned exclusively by the engine for the duration of `run()`.
#[derive(Debug)]
pub struct JobRun {
    pub id: RunId,
    pub started_at: DateTime<Utc>,
    pub phase_filter: PhaseSelector,
    pub silent: bool,
    state: RunState,
    abort: AbortSignal,
}

impl JobRun {
    pub fn new(
        id: impl Into<String>,
        started_at: DateTime<Utc>,
        phase_filter: PhaseSelector,
        silent: bool,
    ) -> Self {
        Self {
            id: id.into(),
            started_at,
            phase_filter,
            silent,
            state: RunState::NotStarted,
            abort: AbortSignal::new(),
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn abort_signal(&self) -> &AbortSignal {
        &self.abort
    }

    pub fn is_aborted(&self) -> bool {
        self.abort.is_raised()
    }

    /// Whether `phase` may run now.
    ///
    /// The first phase ignores the abort flag; every phase honours the filter.
    pub fn is_eligible(&self, phase: Phase) -> bool {
        (phase.is_first() || !self.is_aborted()) && self.phase_filter.admits(phase)
    }

    /// Move the run forward along the fixed lifecycle
    pub fn advance(&mut self, next: RunState) -> Result<()> {
        if next.rank() <= self.state.rank() {
            return Err(DomainError::InvalidStateTransition {
                from: self.state.to_string(),
                to: next.to_string(),
            });
        }
        self.state = next;
        Ok(())
    }
}

/// Aggregated result of one run, returned to the caller of `run()`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobOutcome {
    pub run_id: RunId,
    pub job: String,
    pub started_at: DateTime<Utc>,
    pub synced_at: String,
    pub phase_filter: PhaseSelector,
    pub silent: bool,
    pub aborted: bool,
    pub state: RunState,
    /// Exactly one entry per phase, in lifecycle order
    pub phases: Vec<PhaseResult>,
}

impl JobOutcome {
    pub fn phase(&self, phase: Phase) -> Option<&PhaseResult> {
        self.phases.iter().find(|r| r.phase == phase)
    }

    pub fn outcome_of(&self, phase: Phase) -> PhaseOutcome {
        self.phase(phase)
            .map_or(PhaseOutcome::Skipped, |result| result.outcome)
    }

    pub fn attempted(&self) -> impl Iterator<Item = &PhaseResult> {
        self.phases.iter().filter(|r| r.was_attempted())
    }

    pub fn failures(&self) -> impl Iterator<Item = &PhaseResult> {
        self.phases
            .iter()
            .filter(|r| r.outcome == PhaseOutcome::Failed)
    }

    pub fn has_failures(&self) -> bool {
        self.failures().next().is_some()
    }
}
