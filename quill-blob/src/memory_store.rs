use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::StreamExt;
use tokio::sync::RwLock;

use crate::{BlobError, BlobResult, BlobStore, ByteStream, ObjectHead, PutResult};

#[derive(Debug, Clone)]
struct StoredObject {
    data: Bytes,
    content_type: Option<String>,
}

#[derive(Default)]
struct MemoryInner {
    objects: RwLock<HashMap<String, StoredObject>>,
    puts: AtomicUsize,
    deletes: AtomicUsize,
    fail_puts: AtomicBool,
    fail_deletes: AtomicBool,
}

/// In-process blob store.
///
/// Clones share the same objects, so a test can keep a handle while the
/// gateway owns another. Put/delete failures can be switched on to
/// simulate an unreachable object store.
#[derive(Clone, Default)]
pub struct MemoryBlobStore {
    inner: Arc<MemoryInner>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_puts(&self, fail: bool) {
        self.inner.fail_puts.store(fail, Ordering::SeqCst);
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.inner.fail_deletes.store(fail, Ordering::SeqCst);
    }

    /// Number of put calls that reached the store (including failed ones).
    pub fn put_count(&self) -> usize {
        self.inner.puts.load(Ordering::SeqCst)
    }

    /// Number of delete calls that reached the store (including failed ones).
    pub fn delete_count(&self) -> usize {
        self.inner.deletes.load(Ordering::SeqCst)
    }

    pub async fn contains(&self, key: &str) -> bool {
        self.inner.objects.read().await.contains_key(key)
    }

    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.inner.objects.read().await.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub async fn len(&self) -> usize {
        self.inner.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(
        &self,
        key: &str,
        content_type: Option<&str>,
        mut stream: ByteStream,
    ) -> BlobResult<PutResult> {
        self.inner.puts.fetch_add(1, Ordering::SeqCst);
        if self.inner.fail_puts.load(Ordering::SeqCst) {
            return Err(BlobError::unavailable("memory store rejected put"));
        }

        let mut data = Vec::new();
        while let Some(chunk) = stream.next().await {
            data.extend_from_slice(&chunk?);
        }

        let size_bytes = data.len() as u64;
        self.inner.objects.write().await.insert(
            key.to_string(),
            StoredObject {
                data: Bytes::from(data),
                content_type: content_type.map(|s| s.to_string()),
            },
        );

        Ok(PutResult { size_bytes })
    }

    async fn head(&self, key: &str) -> BlobResult<ObjectHead> {
        let objects = self.inner.objects.read().await;
        let object = objects.get(key).ok_or_else(|| BlobError::not_found(key))?;

        Ok(ObjectHead {
            size_bytes: object.data.len() as u64,
            content_type: object.content_type.clone(),
        })
    }

    async fn delete(&self, key: &str) -> BlobResult<()> {
        self.inner.deletes.fetch_add(1, Ordering::SeqCst);
        if self.inner.fail_deletes.load(Ordering::SeqCst) {
            return Err(BlobError::unavailable("memory store rejected delete"));
        }

        self.inner.objects.write().await.remove(key);
        Ok(())
    }
}
