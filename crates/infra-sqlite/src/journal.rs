// SQLite Journal - notification log, run log and durable sync markers

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::warn;

use exchanger_core::domain::{JobOutcome, Notification, PhaseResult};
use exchanger_core::error::Result;
use exchanger_core::port::{Notifier, SyncMarker, TimeProvider};

use crate::error::map_sqlx_error;

/// One journaled run, as read back from `exchanger_runs`
#[derive(Debug, Clone, PartialEq)]
pub struct RunRecord {
    pub run_id: String,
    pub job: String,
    pub started_at: DateTime<Utc>,
    pub synced_at: String,
    pub phase_filter: String,
    pub silent: bool,
    pub aborted: bool,
    pub failed: bool,
    pub phases: Vec<PhaseResult>,
}

/// Journaled notification (without the run-scoped context columns)
#[derive(Debug, Clone, PartialEq)]
pub struct JournalEntry {
    pub run_id: String,
    pub action: String,
    pub message: String,
    pub silent: bool,
}

pub struct SqliteJournal {
    pool: SqlitePool,
    time_provider: Arc<dyn TimeProvider>,
}

impl SqliteJournal {
    pub fn new(pool: SqlitePool, time_provider: Arc<dyn TimeProvider>) -> Self {
        Self {
            pool,
            time_provider,
        }
    }

    async fn append(&self, notification: &Notification) -> Result<()> {
        let context = serde_json::to_string(&notification.context)?;

        sqlx::query(
            r#"
            INSERT INTO exchanger_notifications (run_id, action, message, context, silent, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&notification.run_id)
        .bind(notification.action.as_str())
        .bind(&notification.message)
        .bind(context)
        .bind(notification.silent)
        .bind(self.time_provider.now_millis())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    /// Persist the outcome of a finished run
    pub async fn record_outcome(&self, outcome: &JobOutcome) -> Result<()> {
        let phases = serde_json::to_string(&outcome.phases)?;

        sqlx::query(
            r#"
            INSERT INTO exchanger_runs (
                run_id, job, started_at, synced_at, phase_filter,
                silent, aborted, failed, phases, recorded_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&outcome.run_id)
        .bind(&outcome.job)
        .bind(outcome.started_at.timestamp_millis())
        .bind(&outcome.synced_at)
        .bind(outcome.phase_filter.to_string())
        .bind(outcome.silent)
        .bind(outcome.aborted)
        .bind(outcome.has_failures())
        .bind(phases)
        .bind(self.time_provider.now_millis())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    /// Most recent runs of `job`, newest first
    pub async fn recent_runs(&self, job: &str, limit: i64) -> Result<Vec<RunRecord>> {
        let rows: Vec<RunRow> = sqlx::query_as(
            r#"
            SELECT run_id, job, started_at, synced_at, phase_filter, silent, aborted, failed, phases
            FROM exchanger_runs
            WHERE job = ?
            ORDER BY started_at DESC, recorded_at DESC
            LIMIT ?
            "#,
        )
        .bind(job)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter().map(RunRow::into_record).collect()
    }

    /// Notifications journaled for one run, in delivery order
    pub async fn entries_for(&self, run_id: &str) -> Result<Vec<JournalEntry>> {
        let rows: Vec<(String, String, String, bool)> = sqlx::query_as(
            "SELECT run_id, action, message, silent FROM exchanger_notifications WHERE run_id = ? ORDER BY id",
        )
        .bind(run_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows
            .into_iter()
            .map(|(run_id, action, message, silent)| JournalEntry {
                run_id,
                action,
                message,
                silent,
            })
            .collect())
    }
}

#[async_trait]
impl Notifier for SqliteJournal {
    async fn notify(&self, notification: &Notification) {
        if let Err(e) = self.append(notification).await {
            warn!(error = %e, action = %notification.action, "Failed to journal notification");
        }
    }
}

#[async_trait]
impl SyncMarker for SqliteJournal {
    async fn mark(&self, job: &str, synced_at: &str) {
        let result = sqlx::query(
            r#"
            INSERT INTO exchanger_sync_markers (job, synced_at, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(job) DO UPDATE SET synced_at = excluded.synced_at, updated_at = excluded.updated_at
            "#,
        )
        .bind(job)
        .bind(synced_at)
        .bind(self.time_provider.now_millis())
        .execute(&self.pool)
        .await;

        if let Err(e) = result {
            warn!(job = %job, error = %map_sqlx_error(e), "Failed to persist sync marker");
        }
    }

    async fn last_synced_at(&self, job: &str) -> Option<String> {
        sqlx::query_scalar("SELECT synced_at FROM exchanger_sync_markers WHERE job = ?")
            .bind(job)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                warn!(job = %job, error = %map_sqlx_error(e), "Failed to read sync marker");
                None
            })
    }
}

/// SQLite row representation of `exchanger_runs`
#[derive(Debug, sqlx::FromRow)]
struct RunRow {
    run_id: String,
    job: String,
    started_at: i64,
    synced_at: String,
    phase_filter: String,
    silent: bool,
    aborted: bool,
    failed: bool,
    phases: String,
}

impl RunRow {
    fn into_record(self) -> Result<RunRecord> {
        let started_at = Utc
            .timestamp_millis_opt(self.started_at)
            .single()
            .unwrap_or_default();
        let phases: Vec<PhaseResult> = serde_json::from_str(&self.phases)?;

        Ok(RunRecord {
            run_id: self.run_id,
            job: self.job,
            started_at,
            synced_at: self.synced_at,
            phase_filter: self.phase_filter,
            silent: self.silent,
            aborted: self.aborted,
            failed: self.failed,
            phases,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{create_pool, run_migrations};
    use exchanger_core::domain::{Action, Phase, PhaseOutcome, PhaseSelector, RunState};
    use exchanger_core::port::time_provider::mocks::FixedTimeProvider;
    use std::time::Duration;

    async fn setup_journal() -> SqliteJournal {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();
        SqliteJournal::new(pool, Arc::new(FixedTimeProvider::sample()))
    }

    fn outcome(run_id: &str, failed: bool) -> JobOutcome {
        let send = if failed {
            PhaseResult::failed(Phase::Send, "network unreachable", Duration::from_millis(12), false)
        } else {
            PhaseResult::succeeded(Phase::Send, Duration::from_millis(12), false)
        };
        JobOutcome {
            run_id: run_id.to_string(),
            job: "exchanger:feeds".to_string(),
            started_at: FixedTimeProvider::sample().now(),
            synced_at: "2024-01-02 03:04:05".to_string(),
            phase_filter: PhaseSelector::Only(Phase::Send),
            silent: false,
            aborted: false,
            state: RunState::Completed,
            phases: vec![
                PhaseResult::skipped(Phase::Collect),
                PhaseResult::skipped(Phase::Store),
                send,
            ],
        }
    }

    #[tokio::test]
    async fn test_notifications_are_journaled_in_order() {
        let journal = setup_journal().await;

        journal
            .notify(&Notification::new("run-1", Action::CommandStarted, "Starting"))
            .await;
        journal
            .notify(&Notification::comment("run-1", "3 articles stored/updated"))
            .await;
        journal
            .notify(&Notification::new("run-2", Action::CommandStarted, "Other run"))
            .await;

        let entries = journal.entries_for("run-1").await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].action, "command.started");
        assert_eq!(entries[1].action, "task.comment");
        assert!(entries[1].silent);
    }

    #[tokio::test]
    async fn test_outcomes_round_trip() {
        let journal = setup_journal().await;
        journal.record_outcome(&outcome("run-1", true)).await.unwrap();

        let runs = journal.recent_runs("exchanger:feeds", 10).await.unwrap();
        assert_eq!(runs.len(), 1);
        let run = &runs[0];
        assert!(run.failed);
        assert_eq!(run.phase_filter, "send");
        assert_eq!(run.phases[2].outcome, PhaseOutcome::Failed);
        assert_eq!(run.phases[2].error.as_deref(), Some("network unreachable"));
        assert_eq!(run.started_at, FixedTimeProvider::sample().now());
    }

    #[tokio::test]
    async fn test_duplicate_run_id_is_rejected() {
        let journal = setup_journal().await;
        journal.record_outcome(&outcome("run-1", false)).await.unwrap();
        let err = journal.record_outcome(&outcome("run-1", false)).await.unwrap_err();
        assert!(err.to_string().contains("Unique constraint"));
    }

    #[tokio::test]
    async fn test_sync_marker_is_durable_per_job() {
        let journal = setup_journal().await;
        assert!(journal.last_synced_at("exchanger:feeds").await.is_none());

        journal.mark("exchanger:feeds", "2024-01-01 00:00:00").await;
        journal.mark("exchanger:feeds", "2024-01-02 00:00:00").await;
        journal.mark("exchanger:other", "2023-12-31 23:59:59").await;

        assert_eq!(
            journal.last_synced_at("exchanger:feeds").await.as_deref(),
            Some("2024-01-02 00:00:00")
        );
        assert_eq!(
            journal.last_synced_at("exchanger:other").await.as_deref(),
            Some("2023-12-31 23:59:59")
        );
    }
}
