use quill_blob::{
    codec, decode_data_url, AssetGateway, AssetId, BlobConfig, BlobError, BlobStore,
    DefaultKeyStrategy, MemoryBlobStore,
};

const TINY_GIF: &str = "data:image/gif;base64,R0lGODlhAQABAAAAACw=";

#[tokio::test]
async fn data_url_upload_then_remove_via_decoded_url() {
    let store = MemoryBlobStore::new();
    let gateway = AssetGateway::new(
        store.clone(),
        BlobConfig::new().with_public_base_url("https://cdn.example.com/photos"),
    );

    let receipt = gateway.upload(decode_data_url(TINY_GIF).unwrap()).await.unwrap();
    assert!(receipt.access_url.starts_with("https://cdn.example.com/photos/blog/"));
    let key = format!("blog/{}", receipt.asset_id);
    assert_eq!(store.head(&key).await.unwrap().content_type.as_deref(), Some("image/gif"));

    // Only the URL is known: recover the id and remove the object.
    let id = codec::decode(&receipt.access_url).unwrap();
    gateway.remove(&id).await.unwrap();

    assert!(store.is_empty().await);
}

#[tokio::test]
async fn custom_key_strategy_controls_layout() {
    let store = MemoryBlobStore::new();
    let gateway = AssetGateway::with_key_strategy(
        store.clone(),
        DefaultKeyStrategy::with_folder("tenants/acme"),
        BlobConfig::new().without_folder(),
    );

    let receipt = gateway.upload(decode_data_url(TINY_GIF).unwrap()).await.unwrap();
    assert_eq!(store.keys().await, vec![format!("tenants/acme/{}", receipt.asset_id)]);
}

#[tokio::test]
async fn unreachable_store_fails_upload_without_leaving_objects() {
    let store = MemoryBlobStore::new();
    store.fail_puts(true);
    let gateway = AssetGateway::new(store.clone(), BlobConfig::default());

    let err = gateway.upload(decode_data_url(TINY_GIF).unwrap()).await.unwrap_err();
    assert!(matches!(err, BlobError::Unavailable { .. }));
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn removing_unknown_asset_is_a_no_op() {
    let gateway = AssetGateway::new(MemoryBlobStore::new(), BlobConfig::default());
    gateway
        .remove(&AssetId::from_string("does-not-exist".to_string()))
        .await
        .unwrap();
}
