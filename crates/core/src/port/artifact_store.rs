// Artifact Store Port
// Durable storage for snapshot artifacts, addressed by storage-relative paths

use async_trait::async_trait;
use std::path::PathBuf;

use crate::domain::ArtifactLocator;
use crate::error::{AppError, Result};

#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Whether an artifact exists at `relative_path`
    async fn exists(&self, relative_path: &str) -> Result<bool>;

    /// Write (replace) the artifact at `relative_path`
    async fn write(&self, relative_path: &str, contents: &[u8]) -> Result<()>;

    /// Absolute location of `relative_path` on the backing storage.
    ///
    /// Fails for paths the store would refuse to read or write.
    fn absolute_path(&self, relative_path: &str) -> Result<PathBuf>;
}

/// Public URL of a job's artifact.
///
/// Fails with `NotFound` when the artifact has not been stored yet; this
/// lookup sits outside the phase lifecycle, so the caller gets the error.
pub async fn public_url(
    locator: &ArtifactLocator,
    store: &dyn ArtifactStore,
    table: &str,
) -> Result<String> {
    let path = locator.relative_path(table);
    if !store.exists(&path).await? {
        return Err(AppError::NotFound(format!("File [{}] not found", path)));
    }
    Ok(locator.url_for(&path))
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Keeps artifacts in memory
    #[derive(Default)]
    pub struct MemoryArtifactStore {
        files: Mutex<HashMap<String, Vec<u8>>>,
    }

    impl MemoryArtifactStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn contents(&self, relative_path: &str) -> Option<String> {
            self.files
                .lock()
                .unwrap()
                .get(relative_path)
                .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
        }
    }

    #[async_trait]
    impl ArtifactStore for MemoryArtifactStore {
        async fn exists(&self, relative_path: &str) -> Result<bool> {
            Ok(self.files.lock().unwrap().contains_key(relative_path))
        }

        async fn write(&self, relative_path: &str, contents: &[u8]) -> Result<()> {
            self.files
                .lock()
                .unwrap()
                .insert(relative_path.to_string(), contents.to_vec());
            Ok(())
        }

        fn absolute_path(&self, relative_path: &str) -> Result<PathBuf> {
            Ok(PathBuf::from("/memory").join(relative_path))
        }
    }
}
