//! Filesystem object store
//!
//! Objects live as files under a root directory, one file per key. Writes
//! go to a temporary sibling first and are renamed into place, so an
//! existence check never sees a partially written result.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::gateway::object_store::{ObjectStore, StoreError, validate_key};
use crate::gateway::signing::{SignedMethod, UrlSigner};

pub struct FsObjectStore {
    root: PathBuf,
    signer: Arc<UrlSigner>,
}

impl FsObjectStore {
    pub fn new(root: impl Into<PathBuf>, signer: Arc<UrlSigner>) -> Self {
        Self {
            root: root.into(),
            signer,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        validate_key(key)?;
        Ok(self.root.join(key))
    }
}

fn infrastructure(key: &str, source: std::io::Error) -> StoreError {
    tracing::error!("Object store failure on {}: {}", key, source);
    StoreError::Infrastructure {
        key: key.to_string(),
        source,
    }
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    fn put_signed_url(&self, key: &str, ttl: Duration) -> Result<String, StoreError> {
        self.signer.sign(SignedMethod::Put, key, ttl)
    }

    fn get_signed_url(&self, key: &str, ttl: Duration) -> Result<String, StoreError> {
        self.signer.sign(SignedMethod::Get, key, ttl)
    }

    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        let path = self.path_for(key)?;

        match tokio::fs::metadata(&path).await {
            Ok(metadata) => Ok(metadata.is_file()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(infrastructure(key, e)),
        }
    }

    async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        let path = self.path_for(key)?;

        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StoreError::NotFound(key.to_string())),
            Err(e) => Err(infrastructure(key, e)),
        }
    }

    async fn put_bytes(&self, key: &str, bytes: Vec<u8>) -> Result<(), StoreError> {
        let path = self.path_for(key)?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| infrastructure(key, e))?;
        }

        let tmp = path.with_file_name(format!(".{}.tmp", Uuid::new_v4()));
        tokio::fs::write(&tmp, &bytes)
            .await
            .map_err(|e| infrastructure(key, e))?;

        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(infrastructure(key, e));
        }

        tracing::debug!("Stored object {} ({} bytes)", key, bytes.len());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let path = self.path_for(key)?;

        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                tracing::info!("Deleted object {}", key);
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(infrastructure(key, e)),
        }
    }
}
