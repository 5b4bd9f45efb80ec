//! Local filesystem artifact store.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, warn};

use clipline_models::{ArtifactKind, ArtifactRef, JobId};

use crate::error::{StorageError, StorageResult};
use crate::key::ArtifactKey;
use crate::ArtifactStore;

/// Artifact store backed by a local directory tree.
///
/// Layout mirrors the key scheme: `sources/`, `clips/<job>/`,
/// `subtitles/<job>/`, `thumbnails/<job>/`, `plans/`.
#[derive(Debug, Clone)]
pub struct LocalArtifactStore {
    root: PathBuf,
}

impl LocalArtifactStore {
    /// Create a store rooted at `root`, creating the directory if needed.
    pub async fn new(root: impl Into<PathBuf>) -> StorageResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    /// Create a store from the `STORAGE_ROOT` env var (default `./data`).
    pub async fn from_env() -> StorageResult<Self> {
        let root = std::env::var("STORAGE_ROOT").unwrap_or_else(|_| "./data".to_string());
        Self::new(root).await
    }

    fn resolve(&self, key: &str) -> StorageResult<PathBuf> {
        // Keys are internally derived, but refuse traversal anyway.
        if key.is_empty() || key.contains("..") || Path::new(key).is_absolute() {
            return Err(StorageError::invalid_key(key));
        }
        Ok(self.root.join(key))
    }

    /// Write bytes atomically: temp file in the target directory, then rename.
    async fn write_atomic(&self, path: &Path, bytes: &[u8]) -> StorageResult<()> {
        let parent = path
            .parent()
            .ok_or_else(|| StorageError::write_failed("key has no parent directory"))?;
        fs::create_dir_all(parent).await?;

        let tmp = path.with_extension("tmp");
        fs::write(&tmp, bytes).await?;
        fs::rename(&tmp, path).await?;
        Ok(())
    }
}

#[async_trait]
impl ArtifactStore for LocalArtifactStore {
    async fn put(&self, key: &ArtifactKey, bytes: &[u8]) -> StorageResult<ArtifactRef> {
        let rendered = key.render();
        let path = self.resolve(&rendered)?;
        self.write_atomic(&path, bytes).await?;
        debug!(key = %rendered, size = bytes.len(), "Stored artifact");
        Ok(ArtifactRef::new(rendered))
    }

    async fn get(&self, artifact: &ArtifactRef) -> StorageResult<Vec<u8>> {
        let path = self.resolve(artifact.as_str())?;
        match fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::not_found(artifact.as_str()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, artifact: &ArtifactRef) -> StorageResult<()> {
        let path = self.resolve(artifact.as_str())?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete_job_artifacts(&self, job_id: &JobId) -> StorageResult<()> {
        // Job-scoped files
        for key in [ArtifactKey::source(job_id), ArtifactKey::plan(job_id)] {
            self.delete(&key.to_ref()).await?;
        }

        // Per-segment directories
        for kind in [
            ArtifactKind::Clip,
            ArtifactKind::Subtitle,
            ArtifactKind::Thumbnail,
        ] {
            let dir = self.root.join(kind.prefix()).join(job_id.as_str());
            match fs::remove_dir_all(&dir).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    warn!(job_id = %job_id, dir = %dir.display(), "Failed to remove artifact dir: {}", e);
                    return Err(e.into());
                }
            }
        }

        debug!(job_id = %job_id, "Deleted job artifacts");
        Ok(())
    }

    fn local_path(&self, artifact: &ArtifactRef) -> Option<PathBuf> {
        self.resolve(artifact.as_str()).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store() -> (tempfile::TempDir, LocalArtifactStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalArtifactStore::new(dir.path()).await.unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn test_put_get_delete_roundtrip() {
        let (_dir, store) = store().await;
        let job_id = JobId::from_string("job-a");
        let key = ArtifactKey::clip(&job_id, 0);

        let artifact = store.put(&key, b"clip bytes").await.unwrap();
        assert_eq!(store.get(&artifact).await.unwrap(), b"clip bytes");

        store.delete(&artifact).await.unwrap();
        assert!(matches!(
            store.get(&artifact).await,
            Err(StorageError::NotFound(_))
        ));
        // Deleting again is a no-op
        store.delete(&artifact).await.unwrap();
    }

    #[tokio::test]
    async fn test_concurrent_writes_to_distinct_keys() {
        let (_dir, store) = store().await;
        let job_id = JobId::from_string("job-b");
        let store = std::sync::Arc::new(store);

        let mut handles = Vec::new();
        for i in 0..8u32 {
            let store = std::sync::Arc::clone(&store);
            let key = ArtifactKey::clip(&job_id, i);
            handles.push(tokio::spawn(async move {
                store.put(&key, format!("clip {i}").as_bytes()).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        for i in 0..8u32 {
            let bytes = store
                .get(&ArtifactKey::clip(&job_id, i).to_ref())
                .await
                .unwrap();
            assert_eq!(bytes, format!("clip {i}").as_bytes());
        }
    }

    #[tokio::test]
    async fn test_delete_job_artifacts_tears_down_everything() {
        let (_dir, store) = store().await;
        let job_id = JobId::from_string("job-c");

        store
            .put(&ArtifactKey::source(&job_id), b"source")
            .await
            .unwrap();
        store
            .put(&ArtifactKey::clip(&job_id, 0), b"clip")
            .await
            .unwrap();
        store
            .put(&ArtifactKey::subtitle(&job_id, 0), b"WEBVTT")
            .await
            .unwrap();
        store
            .put(&ArtifactKey::thumbnail(&job_id, 0), b"jpeg")
            .await
            .unwrap();
        store
            .put(&ArtifactKey::plan(&job_id), b"{}")
            .await
            .unwrap();

        store.delete_job_artifacts(&job_id).await.unwrap();

        for key in [
            ArtifactKey::source(&job_id),
            ArtifactKey::clip(&job_id, 0),
            ArtifactKey::subtitle(&job_id, 0),
            ArtifactKey::thumbnail(&job_id, 0),
            ArtifactKey::plan(&job_id),
        ] {
            assert!(store.get(&key.to_ref()).await.is_err());
        }
    }

    #[tokio::test]
    async fn test_traversal_keys_rejected() {
        let (_dir, store) = store().await;
        let evil = ArtifactRef::new("../outside");
        assert!(matches!(
            store.get(&evil).await,
            Err(StorageError::InvalidKey(_))
        ));
    }
}
