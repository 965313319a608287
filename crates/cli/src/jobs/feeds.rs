// Feeds job: exports feed articles and announces the snapshot for import

use async_trait::async_trait;
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

use exchanger_core::domain::{ArtifactLocator, JobDefinition, Snapshot};
use exchanger_core::port::{
    public_url, ArtifactStore, Delivery, DeliveryRequest, PhaseContext, PhaseError, PhaseStrategy,
};

pub const NAME: &str = "exchanger:feeds";
pub const TABLE: &str = "feeds";
pub const IMPORT_TYPE: &str = "table";
pub const DESCRIPTION: &str = "Send feeds to the import endpoint";

/// Snapshot columns, in order
pub const COLUMNS: [&str; 6] = ["id", "title", "url", "category", "published_at", "synced_at"];

/// Announced when the source holds no articles
const NOTHING_TO_EXPORT: &str = "No articles to export";

/// One feed article as found in the source file
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FeedArticle {
    pub id: u64,
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub published_at: Option<String>,
}

pub fn definition() -> exchanger_core::domain::error::Result<JobDefinition> {
    Ok(JobDefinition::new(NAME, TABLE, IMPORT_TYPE)?.with_description(DESCRIPTION))
}

pub struct FeedsJob {
    source: PathBuf,
    locator: ArtifactLocator,
    store: Arc<dyn ArtifactStore>,
    delivery: Arc<dyn Delivery>,
    articles: Option<Vec<FeedArticle>>,
}

impl FeedsJob {
    pub fn new(
        source: impl Into<PathBuf>,
        locator: ArtifactLocator,
        store: Arc<dyn ArtifactStore>,
        delivery: Arc<dyn Delivery>,
    ) -> Self {
        Self {
            source: source.into(),
            locator,
            store,
            delivery,
            articles: None,
        }
    }

    async fn load(&self) -> Result<Vec<FeedArticle>, PhaseError> {
        let raw = tokio::fs::read(&self.source).await.map_err(|e| {
            PhaseError::msg(format!(
                "Cannot read feeds source {}: {}",
                self.source.display(),
                e
            ))
        })?;
        if raw.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_slice(&raw)?)
    }

    /// Articles gathered by `collect`, loaded on demand when collect was filtered out
    async fn articles(&mut self) -> Result<&[FeedArticle], PhaseError> {
        if self.articles.is_none() {
            self.articles = Some(self.load().await?);
        }
        Ok(self.articles.as_deref().unwrap_or_default())
    }

    fn snapshot(articles: &[FeedArticle], synced_at: &str) -> Result<Snapshot, PhaseError> {
        let mut snapshot = Snapshot::new(COLUMNS);
        for article in articles {
            snapshot.push_row([
                article.id.to_string(),
                article.title.clone(),
                article.url.clone(),
                article.category.clone(),
                article.published_at.clone().unwrap_or_default(),
                synced_at.to_string(),
            ])?;
        }
        Ok(snapshot)
    }
}

#[async_trait]
impl PhaseStrategy for FeedsJob {
    async fn collect(&mut self, ctx: &PhaseContext<'_>) -> Result<(), PhaseError> {
        let articles = self.load().await?;
        debug!(count = articles.len(), source = %self.source.display(), "Feed articles loaded");

        if articles.is_empty() {
            ctx.stop();
            ctx.announce(NOTHING_TO_EXPORT).await;
        } else {
            ctx.comment(format!("{} articles stored/updated", articles.len()))
                .await;
        }

        self.articles = Some(articles);
        Ok(())
    }

    async fn store(&mut self, ctx: &PhaseContext<'_>) -> Result<(), PhaseError> {
        let synced_at = ctx.synced_at().to_string();
        let snapshot = Self::snapshot(self.articles().await?, &synced_at)?;
        let path = self.locator.relative_path(ctx.job().table());

        self.store.write(&path, snapshot.to_csv().as_bytes()).await?;
        ctx.comment(format!("{} rows written to {}", snapshot.len(), path))
            .await;
        Ok(())
    }

    async fn send(&mut self, ctx: &PhaseContext<'_>) -> Result<(), PhaseError> {
        let job = ctx.job();
        let url = public_url(&self.locator, self.store.as_ref(), job.table()).await?;

        let request = DeliveryRequest {
            job: job.name().to_string(),
            table: job.table().to_string(),
            import_type: job.import_type().to_string(),
            url,
            run_id: ctx.run_id().to_string(),
            synced_at: ctx.synced_at().to_string(),
        };

        let receipt = self.delivery.dispatch(&request).await?;
        match receipt.reference {
            Some(reference) => ctx.comment(format!("Import queued as {}", reference)).await,
            None => ctx.comment(format!("Import accepted ({})", receipt.status)).await,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exchanger_core::domain::{AbortSignal, Action, Environment};
    use exchanger_core::port::artifact_store::mocks::MemoryArtifactStore;
    use exchanger_core::port::delivery::mocks::RecordingDelivery;
    use exchanger_core::port::notifier::mocks::RecordingNotifier;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SYNCED_AT: &str = "2024-01-02 03:04:05";

    fn source(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    fn locator() -> ArtifactLocator {
        ArtifactLocator::new(Environment::NonProduction("local".into()), "http://cdn.test")
    }

    struct Harness {
        job: FeedsJob,
        store: Arc<MemoryArtifactStore>,
        delivery: Arc<RecordingDelivery>,
        notifier: RecordingNotifier,
        abort: AbortSignal,
        definition: JobDefinition,
    }

    impl Harness {
        fn new(file: &NamedTempFile, delivery: RecordingDelivery) -> Self {
            let store = Arc::new(MemoryArtifactStore::new());
            let delivery = Arc::new(delivery);
            Self {
                job: FeedsJob::new(file.path(), locator(), store.clone(), delivery.clone()),
                store,
                delivery,
                notifier: RecordingNotifier::new(),
                abort: AbortSignal::new(),
                definition: definition().unwrap(),
            }
        }
    }

    const TWO_ARTICLES: &str = r#"[
        {"id": 1, "title": "Hello, world", "url": "https://example.com/1", "category": "news", "published_at": "2024-01-01"},
        {"id": 2, "title": "Second", "url": "https://example.com/2"}
    ]"#;

    #[tokio::test]
    async fn test_collect_comments_article_count() {
        let file = source(TWO_ARTICLES);
        let mut h = Harness::new(&file, RecordingDelivery::new());
        let ctx = PhaseContext::new("run-1", &h.definition, SYNCED_AT, &h.abort, &h.notifier);

        h.job.collect(&ctx).await.unwrap();

        assert!(!h.abort.is_raised());
        let notifications = h.notifier.notifications();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].message, "2 articles stored/updated");
        assert!(notifications[0].silent);
    }

    #[tokio::test]
    async fn test_empty_source_stops_the_run() {
        let file = source("[]");
        let mut h = Harness::new(&file, RecordingDelivery::new());
        let ctx = PhaseContext::new("run-1", &h.definition, SYNCED_AT, &h.abort, &h.notifier);

        h.job.collect(&ctx).await.unwrap();

        assert!(h.abort.is_raised());
        let notifications = h.notifier.notifications();
        assert_eq!(notifications[0].action, Action::TaskComment);
        assert_eq!(notifications[0].message, NOTHING_TO_EXPORT);
        assert!(!notifications[0].silent);
    }

    #[tokio::test]
    async fn test_invalid_source_fails_collect() {
        let file = source("{ not json");
        let mut h = Harness::new(&file, RecordingDelivery::new());
        let ctx = PhaseContext::new("run-1", &h.definition, SYNCED_AT, &h.abort, &h.notifier);

        let err = h.job.collect(&ctx).await.unwrap_err();
        assert!(matches!(err, PhaseError::Serialization(_)));
    }

    #[tokio::test]
    async fn test_store_writes_csv_snapshot() {
        let file = source(TWO_ARTICLES);
        let mut h = Harness::new(&file, RecordingDelivery::new());
        let ctx = PhaseContext::new("run-1", &h.definition, SYNCED_AT, &h.abort, &h.notifier);

        h.job.collect(&ctx).await.unwrap();
        h.job.store(&ctx).await.unwrap();

        let csv = h.store.contents("exchanger/test/feeds.csv").unwrap();
        assert_eq!(
            csv,
            "id,title,url,category,published_at,synced_at\n\
             1,\"Hello, world\",https://example.com/1,news,2024-01-01,2024-01-02 03:04:05\n\
             2,Second,https://example.com/2,,,2024-01-02 03:04:05\n"
        );
    }

    #[tokio::test]
    async fn test_store_loads_source_when_collect_was_skipped() {
        let file = source(TWO_ARTICLES);
        let mut h = Harness::new(&file, RecordingDelivery::new());
        let ctx = PhaseContext::new("run-1", &h.definition, SYNCED_AT, &h.abort, &h.notifier);

        h.job.store(&ctx).await.unwrap();
        assert!(h.store.contents("exchanger/test/feeds.csv").is_some());
    }

    #[tokio::test]
    async fn test_send_dispatches_public_url() {
        let file = source(TWO_ARTICLES);
        let mut h = Harness::new(&file, RecordingDelivery::new());
        let ctx = PhaseContext::new("run-1", &h.definition, SYNCED_AT, &h.abort, &h.notifier);

        h.job.store(&ctx).await.unwrap();
        h.job.send(&ctx).await.unwrap();

        let requests = h.delivery.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].url, "http://cdn.test/storage/exchanger/test/feeds.csv");
        assert_eq!(requests[0].import_type, "table");
        assert_eq!(requests[0].synced_at, SYNCED_AT);
    }

    #[tokio::test]
    async fn test_send_without_artifact_fails() {
        let file = source(TWO_ARTICLES);
        let mut h = Harness::new(&file, RecordingDelivery::new());
        let ctx = PhaseContext::new("run-1", &h.definition, SYNCED_AT, &h.abort, &h.notifier);

        let err = h.job.send(&ctx).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Not found: File [exchanger/test/feeds.csv] not found"
        );
        assert!(h.delivery.requests().is_empty());
    }

    #[tokio::test]
    async fn test_send_reports_delivery_failure() {
        let file = source(TWO_ARTICLES);
        let mut h = Harness::new(&file, RecordingDelivery::failing("network unreachable"));
        let ctx = PhaseContext::new("run-1", &h.definition, SYNCED_AT, &h.abort, &h.notifier);

        h.job.store(&ctx).await.unwrap();
        let err = h.job.send(&ctx).await.unwrap_err();
        assert!(err.to_string().contains("network unreachable"));
    }
}
