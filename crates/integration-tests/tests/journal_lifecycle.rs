//! Engine runs journaled through SQLite
//!
//! Every notification the engine delivers must land in the journal in
//! delivery order, and the run log must agree with the returned outcome.

use std::sync::Arc;

use exchanger_core::domain::{JobDefinition, Phase, PhaseOutcome};
use exchanger_core::port::id_provider::mocks::SequentialIdProvider;
use exchanger_core::port::notifier::mocks::RecordingNotifier;
use exchanger_core::port::phase_strategy::mocks::{MockBehavior, ScriptedStrategy};
use exchanger_core::port::time_provider::mocks::FixedTimeProvider;
use exchanger_core::port::{FanoutNotifier, SyncMarker};
use exchanger_core::{ExecutionEngine, RunOptions};
use exchanger_infra_sqlite::{create_pool, run_migrations, SqliteJournal};

async fn journal() -> Arc<SqliteJournal> {
    let pool = create_pool(":memory:").await.unwrap();
    run_migrations(&pool).await.unwrap();
    Arc::new(SqliteJournal::new(pool, Arc::new(FixedTimeProvider::sample())))
}

fn engine(
    strategy: ScriptedStrategy,
    journal: &Arc<SqliteJournal>,
    recorder: &Arc<RecordingNotifier>,
) -> ExecutionEngine {
    let job = JobDefinition::new("exchanger:feeds", "feeds", "table").unwrap();
    let notifier = FanoutNotifier::new()
        .with(recorder.clone())
        .with(journal.clone());

    ExecutionEngine::new(job, Box::new(strategy), Arc::new(notifier))
        .with_time_provider(Arc::new(FixedTimeProvider::sample()))
        .with_id_provider(Arc::new(SequentialIdProvider::new()))
        .with_sync_marker(journal.clone())
}

#[tokio::test]
async fn test_full_run_is_journaled_in_order() {
    let journal = journal().await;
    let recorder = Arc::new(RecordingNotifier::new());
    let strategy = ScriptedStrategy::new()
        .on(Phase::Collect, MockBehavior::Comment("3 articles stored/updated".into()));

    let outcome = engine(strategy, &journal, &recorder)
        .run(RunOptions::all())
        .await;
    journal.record_outcome(&outcome).await.unwrap();

    let entries = journal.entries_for("run-1").await.unwrap();
    let actions: Vec<&str> = entries.iter().map(|e| e.action.as_str()).collect();
    assert_eq!(
        actions,
        vec![
            "command.started",
            "task.started",
            "task.comment",
            "task.completed",
            "task.started",
            "task.completed",
            "task.started",
            "task.completed",
            "command.completed",
        ]
    );

    // Journal and in-process sink saw the same stream
    let messages: Vec<String> = entries.into_iter().map(|e| e.message).collect();
    assert_eq!(messages, recorder.messages());

    let runs = journal.recent_runs("exchanger:feeds", 5).await.unwrap();
    assert_eq!(runs.len(), 1);
    assert!(!runs[0].failed);
    assert!(!runs[0].aborted);
    assert_eq!(runs[0].phase_filter, "all");
    assert!(runs[0]
        .phases
        .iter()
        .all(|p| p.outcome == PhaseOutcome::Succeeded));
}

#[tokio::test]
async fn test_failing_send_filter_is_journaled() {
    let journal = journal().await;
    let recorder = Arc::new(RecordingNotifier::new());
    let strategy =
        ScriptedStrategy::new().on(Phase::Send, MockBehavior::Fail("network unreachable".into()));

    let outcome = engine(strategy, &journal, &recorder)
        .run(RunOptions::only(Phase::Send))
        .await;
    journal.record_outcome(&outcome).await.unwrap();

    let entries = journal.entries_for(&outcome.run_id).await.unwrap();
    let actions: Vec<&str> = entries.iter().map(|e| e.action.as_str()).collect();
    assert_eq!(
        actions,
        vec![
            "command.started",
            "task.started",
            "task.error",
            "task.completed",
            "command.completed",
        ]
    );
    assert_eq!(entries[2].message, "network unreachable");

    let run = &journal.recent_runs("exchanger:feeds", 1).await.unwrap()[0];
    assert!(run.failed);
    assert_eq!(run.phase_filter, "send");
    let outcomes: Vec<PhaseOutcome> = run.phases.iter().map(|p| p.outcome).collect();
    assert_eq!(
        outcomes,
        vec![PhaseOutcome::Skipped, PhaseOutcome::Skipped, PhaseOutcome::Failed]
    );
}

#[tokio::test]
async fn test_abort_in_store_is_announced_once() {
    let journal = journal().await;
    let recorder = Arc::new(RecordingNotifier::new());
    let strategy = ScriptedStrategy::new().on(Phase::Store, MockBehavior::Stop);
    let calls = strategy.calls();

    let outcome = engine(strategy, &journal, &recorder)
        .run(RunOptions::all())
        .await;

    assert!(outcome.aborted);
    assert_eq!(*calls.lock().unwrap(), vec![Phase::Collect, Phase::Store]);
    assert_eq!(outcome.outcome_of(Phase::Send), PhaseOutcome::Skipped);

    let entries = journal.entries_for(&outcome.run_id).await.unwrap();
    let aborts: Vec<usize> = entries
        .iter()
        .enumerate()
        .filter(|(_, e)| e.message == "Command aborted")
        .map(|(i, _)| i)
        .collect();
    assert_eq!(aborts.len(), 1);

    // Between Store's task.completed and command.completed
    let at = aborts[0];
    assert_eq!(entries[at - 1].action, "task.completed");
    assert_eq!(entries[at + 1].action, "command.completed");
    assert_eq!(at + 2, entries.len());
}

#[tokio::test]
async fn test_silent_run_journals_only_essentials() {
    let journal = journal().await;
    let recorder = Arc::new(RecordingNotifier::new());
    let strategy = ScriptedStrategy::new()
        .on(Phase::Collect, MockBehavior::Comment("3 articles stored/updated".into()))
        .on(Phase::Store, MockBehavior::Fail("disk full".into()));

    let outcome = engine(strategy, &journal, &recorder)
        .run(RunOptions::all().silent(true))
        .await;

    let entries = journal.entries_for(&outcome.run_id).await.unwrap();
    let actions: Vec<&str> = entries.iter().map(|e| e.action.as_str()).collect();
    assert_eq!(actions, vec!["command.started", "task.error", "command.completed"]);
    assert!(entries.iter().all(|e| !e.silent));
}

#[tokio::test]
async fn test_sync_marker_persisted_per_run() {
    let journal = journal().await;
    let recorder = Arc::new(RecordingNotifier::new());

    let outcome = engine(ScriptedStrategy::new(), &journal, &recorder)
        .run(RunOptions::all())
        .await;

    assert_eq!(outcome.synced_at, "2024-01-02 03:04:05");
    assert_eq!(
        journal.last_synced_at("exchanger:feeds").await.as_deref(),
        Some("2024-01-02 03:04:05")
    );
}

#[tokio::test]
async fn test_journal_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("journal.db");
    let db_path = db_path.to_string_lossy().into_owned();

    {
        let pool = create_pool(&db_path).await.unwrap();
        run_migrations(&pool).await.unwrap();
        let journal = Arc::new(SqliteJournal::new(pool.clone(), Arc::new(FixedTimeProvider::sample())));
        let recorder = Arc::new(RecordingNotifier::new());

        let outcome = engine(ScriptedStrategy::new(), &journal, &recorder)
            .run(RunOptions::all())
            .await;
        journal.record_outcome(&outcome).await.unwrap();
        pool.close().await;
    }

    let pool = create_pool(&db_path).await.unwrap();
    run_migrations(&pool).await.unwrap();
    let journal = SqliteJournal::new(pool, Arc::new(FixedTimeProvider::sample()));

    assert_eq!(journal.recent_runs("exchanger:feeds", 10).await.unwrap().len(), 1);
    assert_eq!(journal.entries_for("run-1").await.unwrap().len(), 8);
    assert!(journal.last_synced_at("exchanger:feeds").await.is_some());
}
