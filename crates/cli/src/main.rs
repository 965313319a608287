//! Exchanger - runs one three-phase export job and exits

mod config;
mod jobs;
mod logging;

use anyhow::{Context, Result};
use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, warn};

use exchanger_core::domain::{JobDefinition, JobOutcome, PhaseOutcome, PhaseSelector};
use exchanger_core::port::{FanoutNotifier, Notifier, PhaseStrategy};
use exchanger_core::{AppError, ExecutionEngine, RunOptions};
use exchanger_infra_sqlite::{create_pool, run_migrations, SqliteJournal};
use exchanger_infra_system::{HttpDelivery, LocalArtifactStore, TracingNotifier};

use config::RunnerConfig;
use jobs::JobDeps;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Exit status when every attempted phase succeeded
const EXIT_OK: u8 = 0;
/// Exit status when at least one attempted phase failed
const EXIT_PHASE_FAILURE: u8 = 1;
/// Exit status for configuration errors (nothing ran)
const EXIT_CONFIG_ERROR: u8 = 2;

#[derive(Parser)]
#[command(name = "exchanger")]
#[command(about = "Run an Exchanger export job", long_about = None)]
#[command(version)]
struct Cli {
    /// Job to run, e.g. `feeds` or `exchanger:feeds`
    job: String,

    /// Run a single phase: collect, store or send
    #[arg(long)]
    only: Option<String>,

    /// Suppress routine progress notifications; any non-empty value enables it
    #[arg(long, num_args = 0..=1, default_missing_value = "1", value_name = "VALUE")]
    silent: Option<String>,

    #[command(flatten)]
    config: RunnerConfig,
}

impl Cli {
    fn is_silent(&self) -> bool {
        self.silent.as_deref().is_some_and(|v| !v.trim().is_empty())
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(logging::LogFormat::parse(&cli.config.log_format));

    info!("Exchanger v{} starting...", VERSION);

    ExitCode::from(exit_status(run(cli).await))
}

/// Exit status for a finished `run`; any error there means nothing ran
fn exit_status(result: Result<u8>) -> u8 {
    match result {
        Ok(code) => code,
        Err(e) => {
            error!(error = %format!("{:#}", e), "Job could not be started");
            EXIT_CONFIG_ERROR
        }
    }
}

/// A job ready to hand to the engine
struct PreparedJob {
    definition: JobDefinition,
    strategy: Box<dyn PhaseStrategy>,
    options: RunOptions,
}

#[cfg(test)]
impl std::fmt::Debug for PreparedJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreparedJob")
            .field("definition", &self.definition)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// Validate the command line and build the requested job.
///
/// Touches no storage, so bad input is rejected before the journal is opened.
fn prepare(cli: &Cli, deps: JobDeps) -> Result<PreparedJob> {
    let selector: PhaseSelector = cli
        .only
        .as_deref()
        .unwrap_or_default()
        .parse()
        .map_err(AppError::from)
        .context("Invalid --only value")?;

    let (definition, strategy) = jobs::build(&cli.job, &cli.config, deps)?;
    info!(
        job = %definition.name(),
        env = %cli.config.environment(),
        only = %selector,
        silent = cli.is_silent(),
        "Job resolved"
    );

    Ok(PreparedJob {
        definition,
        strategy,
        options: RunOptions {
            only: selector,
            silent: cli.is_silent(),
        },
    })
}

/// Wire adapters, run the job once and map its outcome to an exit status.
///
/// Errors returned here happen before any phase starts.
async fn run(cli: Cli) -> Result<u8> {
    let config = &cli.config;

    // 1. Adapters and job
    let delivery = HttpDelivery::new(config.delivery_url.clone(), config.delivery_token.clone());
    if !delivery.is_configured() {
        warn!("EXCHANGER_DELIVERY_URL is not set: the send phase will fail");
    }
    let store = LocalArtifactStore::new(config.storage_root());
    info!(storage_root = %store.root().display(), "Artifact storage ready");
    let deps = JobDeps {
        store: Arc::new(store),
        delivery: Arc::new(delivery),
    };
    let job = prepare(&cli, deps)?;

    // 2. Journal (notification log, run log, sync markers)
    let db_path = config.db_path();
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Cannot create journal directory {}", parent.display()))?;
    }
    info!(db_path = %db_path.display(), "Opening journal...");
    let pool = create_pool(&db_path.to_string_lossy())
        .await
        .context("DB pool creation failed")?;
    run_migrations(&pool).await.context("Migration failed")?;

    let time_provider = Arc::new(exchanger_core::port::time_provider::SystemTimeProvider);
    let journal = Arc::new(SqliteJournal::new(pool, time_provider.clone()));

    // 3. Run
    let notifier: Arc<dyn Notifier> = Arc::new(
        FanoutNotifier::new()
            .with(Arc::new(TracingNotifier::new()))
            .with(journal.clone()),
    );

    let mut engine = ExecutionEngine::new(job.definition, job.strategy, notifier)
        .with_time_provider(time_provider)
        .with_sync_marker(journal.clone());
    let outcome = engine.run(job.options).await;

    if let Err(e) = journal.record_outcome(&outcome).await {
        warn!(error = %e, run_id = %outcome.run_id, "Failed to record run outcome");
    }

    report(&outcome);
    Ok(exit_code(&outcome))
}

fn report(outcome: &JobOutcome) {
    for result in &outcome.phases {
        match result.outcome {
            PhaseOutcome::Succeeded => info!(
                phase = %result.phase,
                duration_ms = result.duration_ms,
                aborted = result.aborted,
                "Phase succeeded"
            ),
            PhaseOutcome::Failed => error!(
                phase = %result.phase,
                duration_ms = result.duration_ms,
                error = result.error.as_deref().unwrap_or_default(),
                "Phase failed"
            ),
            PhaseOutcome::Skipped => info!(phase = %result.phase, "Phase skipped"),
        }
    }
}

fn exit_code(outcome: &JobOutcome) -> u8 {
    if outcome.has_failures() {
        EXIT_PHASE_FAILURE
    } else {
        EXIT_OK
    }
}
