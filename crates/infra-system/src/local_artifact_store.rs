// Local filesystem artifact store
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info};

use exchanger_core::domain::DomainError;
use exchanger_core::error::Result;
use exchanger_core::port::ArtifactStore;

/// Suffix of the staging file written before the atomic rename
const STAGING_SUFFIX: &str = "partial";

/// Stores artifacts below a root directory
pub struct LocalArtifactStore {
    root: PathBuf,
}

impl LocalArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a storage-relative path, refusing anything that escapes the root
    fn resolve(&self, relative_path: &str) -> Result<PathBuf> {
        let relative = Path::new(relative_path);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if relative_path.is_empty() || escapes {
            return Err(DomainError::ValidationError(format!(
                "artifact path '{}' must stay inside the storage root",
                relative_path
            ))
            .into());
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ArtifactStore for LocalArtifactStore {
    async fn exists(&self, relative_path: &str) -> Result<bool> {
        let path = self.resolve(relative_path)?;
        Ok(tokio::fs::try_exists(&path).await?)
    }

    async fn write(&self, relative_path: &str, contents: &[u8]) -> Result<()> {
        let path = self.resolve(relative_path)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        // Readers never see a half-written artifact
        let staging = path.with_extension(STAGING_SUFFIX);
        tokio::fs::write(&staging, contents).await?;
        tokio::fs::rename(&staging, &path).await?;

        info!(path = %path.display(), bytes = contents.len(), "Artifact written");
        Ok(())
    }

    fn absolute_path(&self, relative_path: &str) -> Result<PathBuf> {
        debug!(relative_path = %relative_path, "Resolving absolute artifact path");
        self.resolve(relative_path)
    }
}
