use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::RwLock;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Durable blob storage for attachments and transcripts. Uploads must be
/// durable here before any database row references them.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store an object and return its public URL.
    async fn put(&self, key: &str, data: Bytes, content_type: &str)
    -> Result<String, StorageError>;

    async fn get(&self, key: &str) -> Result<Bytes, StorageError>;

    async fn delete(&self, key: &str) -> Result<(), StorageError>;
}

/// In-process store used for development and tests. Mirrors the bucket/key
/// addressing of the S3-backed deployment.
pub struct MemoryObjectStore {
    bucket: String,
    region: String,
    objects: RwLock<HashMap<String, Bytes>>,
}

impl MemoryObjectStore {
    pub fn new(bucket: String, region: String) -> Self {
        Self { bucket, region, objects: RwLock::new(HashMap::new()) }
    }

    fn url_for(&self, key: &str) -> String {
        format!("https://{}.s3.{}.amazonaws.com/{}", self.bucket, self.region, key)
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put(
        &self,
        key: &str,
        data: Bytes,
        _content_type: &str,
    ) -> Result<String, StorageError> {
        let mut objects =
            self.objects.write().map_err(|e| StorageError::Backend(e.to_string()))?;
        objects.insert(key.to_string(), data);
        Ok(self.url_for(key))
    }

    async fn get(&self, key: &str) -> Result<Bytes, StorageError> {
        let objects = self.objects.read().map_err(|e| StorageError::Backend(e.to_string()))?;
        objects.get(key).cloned().ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let mut objects =
            self.objects.write().map_err(|e| StorageError::Backend(e.to_string()))?;
        objects.remove(key);
        Ok(())
    }
}
