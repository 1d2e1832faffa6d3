use std::sync::Arc;

use tracing::{debug, info};

use crate::{
    codec, AssetId, AssetReceipt, BlobConfig, BlobError, BlobKeyStrategy, BlobResult, BlobStore,
    DefaultKeyStrategy, PhotoPayload,
};

/// The asset gateway: uploads and removes photos in the object store.
///
/// Services embed this rather than talking to a `BlobStore` directly.
pub struct AssetGateway {
    store: Arc<dyn BlobStore>,
    keys: Arc<dyn BlobKeyStrategy>,
    config: BlobConfig,
}

impl AssetGateway {
    /// Create a gateway using the default `<folder>/<id>` key layout.
    pub fn new<S: BlobStore + 'static>(store: S, config: BlobConfig) -> Self {
        let keys = match &config.folder {
            Some(folder) => DefaultKeyStrategy::with_folder(folder.clone()),
            None => DefaultKeyStrategy::new(),
        };
        Self {
            store: Arc::new(store),
            keys: Arc::new(keys),
            config,
        }
    }

    /// Create with custom key strategy
    pub fn with_key_strategy<S: BlobStore + 'static, K: BlobKeyStrategy + 'static>(
        store: S,
        keys: K,
        config: BlobConfig,
    ) -> Self {
        Self {
            store: Arc::new(store),
            keys: Arc::new(keys),
            config,
        }
    }

    /// Upload a photo and return its access URL and asset id.
    ///
    /// Payload checks run before any network call. On failure nothing is
    /// assumed to be visible in the store.
    pub async fn upload(&self, payload: PhotoPayload) -> BlobResult<AssetReceipt> {
        crate::payload::ensure_image(&payload.content_type)?;

        if payload.is_empty() {
            return Err(BlobError::invalid("photo is empty"));
        }
        if payload.len() > self.config.max_photo_bytes {
            return Err(BlobError::TooLarge {
                size: payload.len(),
                max: self.config.max_photo_bytes,
            });
        }

        let asset_id = AssetId::new();
        let key = self.keys.object_key(&asset_id);
        let content_type = payload.content_type.clone();

        let result = self
            .store
            .put(&key, Some(&content_type), payload.into_stream())
            .await?;

        let access_url = self.config.access_url(&key);
        info!(asset_id = %asset_id, key = %key, size = result.size_bytes, "asset uploaded");

        Ok(AssetReceipt::new(asset_id, access_url))
    }

    /// Remove an asset. Removing an asset that no longer exists succeeds.
    pub async fn remove(&self, id: &AssetId) -> BlobResult<()> {
        let key = self.keys.object_key(id);
        match self.store.delete(&key).await {
            Ok(()) | Err(BlobError::NotFound { .. }) => {
                debug!(asset_id = %id, key = %key, "asset removed");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Whether the asset currently exists in the store.
    pub async fn exists(&self, id: &AssetId) -> BlobResult<bool> {
        let key = self.keys.object_key(id);
        match self.store.head(&key).await {
            Ok(_) => Ok(true),
            Err(BlobError::NotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Recover the asset id from an access URL (see [`codec::decode`] for
    /// the precondition this relies on).
    pub fn resolve_asset_id(&self, access_url: &str) -> BlobResult<AssetId> {
        codec::decode(access_url)
    }

    /// Get configuration
    pub fn config(&self) -> &BlobConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryBlobStore;

    fn png() -> PhotoPayload {
        PhotoPayload::new("image/png", &b"\x89PNG fake"[..])
    }

    #[tokio::test]
    async fn upload_returns_url_ending_in_asset_id() {
        let store = MemoryBlobStore::new();
        let gateway = AssetGateway::new(store.clone(), BlobConfig::default());

        let receipt = gateway.upload(png()).await.unwrap();
        let key = format!("blog/{}", receipt.asset_id);
        assert_eq!(receipt.access_url, format!("memory://assets/{key}"));
        assert!(store.contains(&key).await);
        assert_eq!(store.head(&key).await.unwrap().content_type.as_deref(), Some("image/png"));

        let decoded = gateway.resolve_asset_id(&receipt.access_url).unwrap();
        assert_eq!(decoded, receipt.asset_id);
    }

    #[tokio::test]
    async fn oversized_and_non_image_payloads_never_reach_the_store() {
        let store = MemoryBlobStore::new();
        let gateway = AssetGateway::new(store.clone(), BlobConfig::default().with_max_photo_bytes(4));

        let err = gateway.upload(png()).await.unwrap_err();
        assert!(matches!(err, BlobError::TooLarge { max: 4, .. }));

        let err = gateway
            .upload(PhotoPayload::new("application/pdf", &b"x"[..]))
            .await
            .unwrap_err();
        assert!(err.is_invalid_input());

        assert_eq!(store.put_count(), 0);
    }

    #[tokio::test]
    async fn remove_is_idempotent() {
        let store = MemoryBlobStore::new();
        let gateway = AssetGateway::new(store.clone(), BlobConfig::default());
        let receipt = gateway.upload(png()).await.unwrap();

        gateway.remove(&receipt.asset_id).await.unwrap();
        gateway.remove(&receipt.asset_id).await.unwrap();
        assert!(!gateway.exists(&receipt.asset_id).await.unwrap());
    }

    #[tokio::test]
    async fn remove_surfaces_backend_failures() {
        let store = MemoryBlobStore::new();
        let gateway = AssetGateway::new(store.clone(), BlobConfig::default());
        let receipt = gateway.upload(png()).await.unwrap();

        store.fail_deletes(true);
        assert!(gateway.remove(&receipt.asset_id).await.is_err());
        assert!(gateway.exists(&receipt.asset_id).await.unwrap());
    }
}
