//! Object store contract

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Errors raised by object store backends
///
/// `NotFound` is an expected outcome; everything else is an infrastructure
/// fault that callers log and surface.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("object not found: {0}")]
    NotFound(String),

    #[error("invalid object key: {0:?}")]
    InvalidKey(String),

    #[error("object store failure on {key}: {source}")]
    Infrastructure {
        key: String,
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

/// Blob storage addressed by string keys
///
/// All operations are independent; no ordering is implied between calls
/// for different keys.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Write-capable URL for `key`, valid for `ttl`
    fn put_signed_url(&self, key: &str, ttl: Duration) -> Result<String, StoreError>;

    /// Read-capable URL for `key`, valid for `ttl`
    fn get_signed_url(&self, key: &str, ttl: Duration) -> Result<String, StoreError>;

    /// Existence check; never transfers the body
    ///
    /// Returns `Ok(false)` for a missing object.
    async fn exists(&self, key: &str) -> Result<bool, StoreError>;

    /// Reads the whole object
    async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, StoreError>;

    /// Stores `bytes` under `key`, replacing any previous object
    async fn put_bytes(&self, key: &str, bytes: Vec<u8>) -> Result<(), StoreError>;

    /// Removes the object; deleting a missing object succeeds
    async fn delete(&self, key: &str) -> Result<(), StoreError>;
}

/// Checks that `key` is a relative path made of safe segments
pub fn validate_key(key: &str) -> Result<(), StoreError> {
    let valid_char = |c: char| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '/');

    let valid = !key.is_empty()
        && key.chars().all(valid_char)
        && key
            .split('/')
            .all(|segment| !segment.is_empty() && segment != "." && segment != "..");

    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidKey(key.to_string()))
    }
}
