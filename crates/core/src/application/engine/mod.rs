// Execution Engine - fixed three-phase job lifecycle

pub mod constants;
mod panic_guard;

pub use panic_guard::{execute_guarded_async, PanicGuardResult};

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::domain::{
    Action, JobDefinition, JobOutcome, JobRun, Notification, Phase, PhaseResult, PhaseSelector,
    RunState,
};
use crate::port::id_provider::UuidProvider;
use crate::port::time_provider::{format_synced_at, SystemTimeProvider};
use crate::port::{
    GlobalSyncMarker, IdProvider, Notifier, PhaseContext, PhaseError, PhaseStrategy, SilenceGate,
    SyncMarker, TimeProvider,
};
use constants::*;

/// Per-invocation options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    pub only: PhaseSelector,
    pub silent: bool,
}

impl RunOptions {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn only(phase: Phase) -> Self {
        Self {
            only: PhaseSelector::Only(phase),
            silent: false,
        }
    }

    pub fn silent(mut self, silent: bool) -> Self {
        self.silent = silent;
        self
    }
}

/// Drives Collect, Store and Send in that order for one job.
///
/// Phase failures (errors and panics) are isolated per phase and reported
/// as `task.error`; `run` itself never fails and always ends with exactly one
/// `command.completed` notification.
pub struct ExecutionEngine {
    job: JobDefinition,
    strategy: Box<dyn PhaseStrategy>,
    notifier: Arc<dyn Notifier>,
    time_provider: Arc<dyn TimeProvider>,
    id_provider: Arc<dyn IdProvider>,
    sync_marker: Arc<dyn SyncMarker>,
}

impl ExecutionEngine {
    /// Create an engine with production providers (system clock, UUIDs,
    /// process-wide sync marker)
    pub fn new(
        job: JobDefinition,
        strategy: Box<dyn PhaseStrategy>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            job,
            strategy,
            notifier,
            time_provider: Arc::new(SystemTimeProvider),
            id_provider: Arc::new(UuidProvider),
            sync_marker: Arc::new(GlobalSyncMarker),
        }
    }

    pub fn with_time_provider(mut self, time_provider: Arc<dyn TimeProvider>) -> Self {
        self.time_provider = time_provider;
        self
    }

    pub fn with_id_provider(mut self, id_provider: Arc<dyn IdProvider>) -> Self {
        self.id_provider = id_provider;
        self
    }

    pub fn with_sync_marker(mut self, sync_marker: Arc<dyn SyncMarker>) -> Self {
        self.sync_marker = sync_marker;
        self
    }

    pub fn job(&self) -> &JobDefinition {
        &self.job
    }

    /// Execute one run of the job
    pub async fn run(&mut self, options: RunOptions) -> JobOutcome {
        let started_at = self.time_provider.now();
        let run = JobRun::new(
            self.id_provider.generate_id(),
            started_at,
            options.only,
            options.silent,
        );
        let span = info_span!("job_run", run_id = %run.id, job = %self.job.name());

        self.drive(run).instrument(span).await
    }

    async fn drive(&mut self, mut run: JobRun) -> JobOutcome {
        let synced_at = format_synced_at(run.started_at);
        self.sync_marker.mark(self.job.name(), &synced_at).await;

        let reporter = SilenceGate::new(Arc::clone(&self.notifier), run.silent);

        let mut started = Notification::new(
            &run.id,
            Action::CommandStarted,
            format!("Starting `{}` command", self.job.name()),
        );
        if let Some(only) = run.phase_filter.only() {
            started = started.with_context(CONTEXT_ONLY, only.as_str());
        }
        reporter.notify(&started).await;

        info!(only = %run.phase_filter, silent = run.silent, synced_at = %synced_at, "Command started");

        let mut phases = Vec::with_capacity(Phase::ALL.len());
        for phase in Phase::ALL {
            if !run.is_eligible(phase) {
                debug!(
                    phase = %phase,
                    aborted = run.is_aborted(),
                    "Phase not eligible, skipping"
                );
                transition(&mut run, RunState::Skipped(phase));
                phases.push(PhaseResult::skipped(phase));
                continue;
            }

            transition(&mut run, RunState::Running(phase));
            let result = self.run_phase(&run, phase, &synced_at, &reporter).await;
            phases.push(result);
        }

        transition(&mut run, RunState::Completed);

        reporter
            .notify(&Notification::new(
                &run.id,
                Action::CommandCompleted,
                format!("`{}` command completed", self.job.name()),
            ))
            .await;

        let outcome = JobOutcome {
            run_id: run.id.clone(),
            job: self.job.name().to_string(),
            started_at: run.started_at,
            synced_at,
            phase_filter: run.phase_filter,
            silent: run.silent,
            aborted: run.is_aborted(),
            state: run.state(),
            phases,
        };

        info!(
            aborted = outcome.aborted,
            attempted = outcome.attempted().count(),
            failures = outcome.failures().count(),
            "Command completed"
        );
        outcome
    }

    /// Run one eligible phase inside its failure-isolation boundary
    async fn run_phase(
        &mut self,
        run: &JobRun,
        phase: Phase,
        synced_at: &str,
        reporter: &SilenceGate,
    ) -> PhaseResult {
        reporter
            .notify(
                &Notification::new(&run.id, Action::TaskStarted, format!("{} started", phase.label()))
                    .with_context(CONTEXT_PHASE, phase.as_str())
                    .silenced(),
            )
            .await;

        let aborted_before = run.is_aborted();
        let ctx = PhaseContext::new(&run.id, &self.job, synced_at, run.abort_signal(), reporter);

        let clock = Instant::now();
        let guarded = execute_guarded_async(invoke(self.strategy.as_mut(), phase, &ctx)).await;
        let elapsed = clock.elapsed();

        let failure = match guarded {
            PanicGuardResult::Success(Ok(())) => None,
            PanicGuardResult::Success(Err(e)) => Some(e.to_string()),
            PanicGuardResult::Panicked(msg) => Some(PhaseError::Panicked(msg).to_string()),
        };
        let aborted_here = !aborted_before && run.is_aborted();

        if let Some(message) = &failure {
            warn!(phase = %phase, error = %message, "Phase failed");
            reporter
                .notify(
                    &Notification::new(&run.id, Action::TaskError, message.clone())
                        .with_context(CONTEXT_PHASE, phase.as_str()),
                )
                .await;
        }

        reporter
            .notify(
                &Notification::new(
                    &run.id,
                    Action::TaskCompleted,
                    format!("Completed in {} seconds", elapsed.as_secs()),
                )
                .with_context(CONTEXT_PHASE, phase.as_str())
                .with_context(CONTEXT_ELAPSED_MS, elapsed.as_millis() as u64)
                .silenced(),
            )
            .await;

        if aborted_here {
            info!(phase = %phase, "Command aborted");
            reporter
                .notify(
                    &Notification::new(&run.id, Action::TaskComment, ABORT_MESSAGE)
                        .with_context(CONTEXT_PHASE, phase.as_str()),
                )
                .await;
        }

        debug!(phase = %phase, elapsed_ms = elapsed.as_millis() as u64, "Phase finished");

        match failure {
            None => PhaseResult::succeeded(phase, elapsed, aborted_here),
            Some(message) => PhaseResult::failed(phase, message, elapsed, aborted_here),
        }
    }
}

async fn invoke(
    strategy: &mut dyn PhaseStrategy,
    phase: Phase,
    ctx: &PhaseContext<'_>,
) -> Result<(), PhaseError> {
    match phase {
        Phase::Collect => strategy.collect(ctx).await,
        Phase::Store => strategy.store(ctx).await,
        Phase::Send => strategy.send(ctx).await,
    }
}

fn transition(run: &mut JobRun, next: RunState) {
    if let Err(e) = run.advance(next) {
        // Unreachable with the fixed phase order; never surfaced to callers
        error!(error = %e, "Run state machine violated");
    }
}
