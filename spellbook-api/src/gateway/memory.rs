//! In-memory object store

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::gateway::object_store::{ObjectStore, StoreError, validate_key};
use crate::gateway::signing::{SignedMethod, UrlSigner};

/// Object store kept in a hash map
///
/// Signed URLs are real and verifiable, so the blob endpoint works against
/// this backend the same way it does against the filesystem one.
pub struct InMemoryObjectStore {
    objects: RwLock<HashMap<String, Vec<u8>>>,
    signer: Arc<UrlSigner>,
}

impl InMemoryObjectStore {
    pub fn new(signer: Arc<UrlSigner>) -> Self {
        Self {
            objects: RwLock::new(HashMap::new()),
            signer,
        }
    }

    /// Number of stored objects
    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    fn put_signed_url(&self, key: &str, ttl: Duration) -> Result<String, StoreError> {
        self.signer.sign(SignedMethod::Put, key, ttl)
    }

    fn get_signed_url(&self, key: &str, ttl: Duration) -> Result<String, StoreError> {
        self.signer.sign(SignedMethod::Get, key, ttl)
    }

    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        validate_key(key)?;
        Ok(self.objects.read().await.contains_key(key))
    }

    async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        validate_key(key)?;
        self.objects
            .read()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    async fn put_bytes(&self, key: &str, bytes: Vec<u8>) -> Result<(), StoreError> {
        validate_key(key)?;
        self.objects.write().await.insert(key.to_string(), bytes);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        validate_key(key)?;
        self.objects.write().await.remove(key);
        Ok(())
    }
}
