// Sync Marker Port
// Process-wide "last synced at" state, initialised at the start of every run

use async_trait::async_trait;
use std::sync::{OnceLock, RwLock};

/// Holder of the last-synced marker (`YYYY-MM-DD HH:MM:SS`)
#[async_trait]
pub trait SyncMarker: Send + Sync {
    /// Record that `job` started syncing at `synced_at`
    async fn mark(&self, job: &str, synced_at: &str);

    /// Most recent marker for `job`, if any run has set one
    async fn last_synced_at(&self, job: &str) -> Option<String>;
}

/// In-memory marker shared by the whole process; not durable across restarts
#[derive(Default)]
pub struct ProcessSyncMarker {
    latest: RwLock<Option<(String, String)>>,
}

impl ProcessSyncMarker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide instance
    pub fn global() -> &'static ProcessSyncMarker {
        static GLOBAL: OnceLock<ProcessSyncMarker> = OnceLock::new();
        GLOBAL.get_or_init(ProcessSyncMarker::new)
    }

    /// Marker of the most recent run, regardless of job
    pub fn current(&self) -> Option<String> {
        self.latest
            .read()
            .ok()
            .and_then(|guard| guard.as_ref().map(|(_, at)| at.clone()))
    }
}

#[async_trait]
impl SyncMarker for ProcessSyncMarker {
    async fn mark(&self, job: &str, synced_at: &str) {
        if let Ok(mut guard) = self.latest.write() {
            *guard = Some((job.to_string(), synced_at.to_string()));
        }
    }

    async fn last_synced_at(&self, job: &str) -> Option<String> {
        self.latest.read().ok().and_then(|guard| {
            guard
                .as_ref()
                .filter(|(marked_job, _)| marked_job == job)
                .map(|(_, at)| at.clone())
        })
    }
}

/// Forwards to the process-wide instance
pub struct GlobalSyncMarker;

#[async_trait]
impl SyncMarker for GlobalSyncMarker {
    async fn mark(&self, job: &str, synced_at: &str) {
        ProcessSyncMarker::global().mark(job, synced_at).await;
    }

    async fn last_synced_at(&self, job: &str) -> Option<String> {
        ProcessSyncMarker::global().last_synced_at(job).await
    }
}
