// Phase Domain Model

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

use super::error::DomainError;

/// One of the three fixed stages of a job, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Collect,
    Store,
    Send,
}

impl Phase {
    /// All phases in the order the engine drives them
    pub const ALL: [Phase; 3] = [Phase::Collect, Phase::Store, Phase::Send];

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Collect => "collect",
            Phase::Store => "store",
            Phase::Send => "send",
        }
    }

    /// Whether this is the phase that opens the lifecycle
    pub fn is_first(&self) -> bool {
        *self == Phase::Collect
    }

    /// Progressive label used in "<label> started" notifications
    pub fn label(&self) -> &'static str {
        match self {
            Phase::Collect => "Collecting",
            Phase::Store => "Storing",
            Phase::Send => "Sending",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Phase {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "collect" => Ok(Phase::Collect),
            "store" => Ok(Phase::Store),
            "send" => Ok(Phase::Send),
            _ => Err(DomainError::UnknownPhase(s.to_string())),
        }
    }
}

/// Which phases a run is allowed to attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseSelector {
    #[default]
    All,
    Only(Phase),
}

impl PhaseSelector {
    /// True when no filter is set or the filter names exactly `phase`
    pub fn admits(&self, phase: Phase) -> bool {
        match self {
            PhaseSelector::All => true,
            PhaseSelector::Only(only) => *only == phase,
        }
    }

    /// The filtered phase, if any
    pub fn only(&self) -> Option<Phase> {
        match self {
            PhaseSelector::All => None,
            PhaseSelector::Only(phase) => Some(*phase),
        }
    }
}

impl From<Option<Phase>> for PhaseSelector {
    fn from(only: Option<Phase>) -> Self {
        only.map_or(PhaseSelector::All, PhaseSelector::Only)
    }
}

impl FromStr for PhaseSelector {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("all") {
            return Ok(PhaseSelector::All);
        }
        trimmed.parse().map(PhaseSelector::Only)
    }
}

impl std::fmt::Display for PhaseSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PhaseSelector::All => f.write_str("all"),
            PhaseSelector::Only(phase) => write!(f, "{}", phase),
        }
    }
}

/// How a phase attempt ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PhaseOutcome {
    Succeeded,
    Failed,
    Skipped,
}

impl std::fmt::Display for PhaseOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PhaseOutcome::Succeeded => write!(f, "SUCCEEDED"),
            PhaseOutcome::Failed => write!(f, "FAILED"),
            PhaseOutcome::Skipped => write!(f, "SKIPPED"),
        }
    }
}

/// Per-phase record produced by the engine; drives reporting only
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseResult {
    pub phase: Phase,
    pub outcome: PhaseOutcome,
    /// Failure message, present iff `outcome == Failed`
    pub error: Option<String>,
    /// Wall time of the phase invocation (zero when skipped)
    pub duration_ms: u64,
    /// Abort signal was raised from inside this phase
    pub aborted: bool,
}

impl PhaseResult {
    pub fn skipped(phase: Phase) -> Self {
        Self {
            phase,
            outcome: PhaseOutcome::Skipped,
            error: None,
            duration_ms: 0,
            aborted: false,
        }
    }

    pub fn succeeded(phase: Phase, duration: Duration, aborted: bool) -> Self {
        Self {
            phase,
            outcome: PhaseOutcome::Succeeded,
            error: None,
            duration_ms: duration_millis(duration),
            aborted,
        }
    }

    pub fn failed(phase: Phase, message: impl Into<String>, duration: Duration, aborted: bool) -> Self {
        Self {
            phase,
            outcome: PhaseOutcome::Failed,
            error: Some(message.into()),
            duration_ms: duration_millis(duration),
            aborted,
        }
    }

    /// Whether the phase body was invoked at all
    pub fn was_attempted(&self) -> bool {
        self.outcome != PhaseOutcome::Skipped
    }

    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }
}

fn duration_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
