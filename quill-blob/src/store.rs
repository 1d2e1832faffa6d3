use async_trait::async_trait;

use crate::{AssetId, BlobResult, ByteStream};

/// Core blob storage operations - must be implemented by all storage backends
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store a blob from a stream
    async fn put(
        &self,
        key: &str,
        content_type: Option<&str>,
        stream: ByteStream,
    ) -> BlobResult<PutResult>;

    /// Get blob metadata without content.
    ///
    /// Returns `BlobError::NotFound` when the key does not exist.
    async fn head(&self, key: &str) -> BlobResult<ObjectHead>;

    /// Delete a blob. Deleting a missing key succeeds.
    async fn delete(&self, key: &str) -> BlobResult<()>;
}

/// Result of a successful put operation
#[derive(Debug, Clone)]
pub struct PutResult {
    pub size_bytes: u64,
}

/// Metadata about a blob
#[derive(Debug, Clone)]
pub struct ObjectHead {
    pub size_bytes: u64,
    pub content_type: Option<String>,
}

/// Strategy for mapping asset ids to object keys
pub trait BlobKeyStrategy: Send + Sync {
    /// Object key for an asset
    fn object_key(&self, id: &AssetId) -> String;
}

/// Default key strategy: `<folder>/<asset_id>`, or the bare id when no
/// folder is configured.
#[derive(Debug, Clone, Default)]
pub struct DefaultKeyStrategy {
    folder: Option<String>,
}

impl DefaultKeyStrategy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_folder<S: Into<String>>(folder: S) -> Self {
        let folder = folder.into();
        let folder = folder.trim_matches('/');
        Self {
            folder: (!folder.is_empty()).then(|| folder.to_string()),
        }
    }
}

impl BlobKeyStrategy for DefaultKeyStrategy {
    fn object_key(&self, id: &AssetId) -> String {
        match &self.folder {
            Some(folder) => format!("{}/{}", folder, id.as_str()),
            None => id.as_str().to_string(),
        }
    }
}
