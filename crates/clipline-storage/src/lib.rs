//! Artifact store for the Clipline pipeline.
//!
//! This crate provides:
//! - Deterministic artifact keys derived from (job, segment, kind)
//! - A narrow `ArtifactStore` trait (put/get/delete, whole-job teardown)
//! - A local filesystem backend
//!
//! Keys for distinct artifacts never collide by construction, so concurrent
//! sub-job writes need no coordination.

pub mod error;
pub mod key;
pub mod local;

pub use error::{StorageError, StorageResult};
pub use key::ArtifactKey;
pub use local::LocalArtifactStore;

use async_trait::async_trait;
use clipline_models::{ArtifactRef, JobId};

/// Narrow storage contract consumed by the pipeline.
///
/// Implementations must support concurrent writes to distinct keys. Writes to
/// the same key never occur: each key is derived once per (job, segment, kind).
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Store bytes under a deterministic key, returning a handle.
    async fn put(&self, key: &ArtifactKey, bytes: &[u8]) -> StorageResult<ArtifactRef>;

    /// Fetch the bytes behind a handle.
    async fn get(&self, artifact: &ArtifactRef) -> StorageResult<Vec<u8>>;

    /// Delete a single artifact. Deleting a missing artifact is not an error.
    async fn delete(&self, artifact: &ArtifactRef) -> StorageResult<()>;

    /// Tear down every artifact belonging to a job.
    async fn delete_job_artifacts(&self, job_id: &JobId) -> StorageResult<()>;

    /// Resolve a handle to a local path, when the backend has one.
    ///
    /// The media toolchain reads sources and clips through the filesystem, so
    /// the local backend exposes its paths directly instead of copying bytes.
    fn local_path(&self, artifact: &ArtifactRef) -> Option<std::path::PathBuf>;
}
