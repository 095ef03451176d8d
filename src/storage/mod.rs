//! Object storage seam.
//!
//! The pipeline only needs get, put and presigned GET URLs. `S3ObjectStore`
//! is the production backend; tests substitute an in-memory store.

pub mod s3;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::StorageError;

pub use s3::S3ObjectStore;

/// Minimal object store used by the fetcher and the attachment relocator.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Read a whole object into memory.
    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StorageError>;

    /// Write an object, replacing any existing one.
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError>;

    /// Produce a signed, read-only URL for an object.
    async fn presign_get(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> Result<String, StorageError>;
}
