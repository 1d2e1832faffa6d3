use std::time::Duration;

use anyhow::{bail, Context, Result};
use axum::Router;
use quill_blob::{AssetGateway, BlobConfig, MemoryBlobStore, S3CompatibleStore, S3Config};
use quill_core::{QuillConfig, QuillConfigSnapshot};
use quill_posts::{BlogLifecycle, MemoryRecordStore};
use tokio::net::{TcpListener, ToSocketAddrs};

use crate::rest;

/// Environment prefix: `QUILL__BLOB__BUCKET` sets `blob.bucket`.
pub const ENV_PREFIX: &str = "QUILL__";

const DEFAULT_MAX_PHOTO_BYTES: usize = 10 * 1024 * 1024;

pub struct QuillApp {
    pub config: QuillConfigSnapshot,
    pub blog: BlogLifecycle,
    pub router: Router<()>,
}

impl QuillApp {
    pub fn addr(&self) -> String {
        format!(
            "{}:{}",
            self.config.get_or("http.host", "127.0.0.1"),
            self.config.get_or("http.port", "3036")
        )
    }

    pub async fn listen<A>(self, addr: A) -> Result<()>
    where
        A: ToSocketAddrs,
    {
        let listener = TcpListener::bind(addr).await?;
        axum::serve(listener, self.router).await?;
        Ok(())
    }
}

/// Defaults for every key the server reads. Values already set win.
pub fn apply_defaults(config: &mut QuillConfig) {
    config.set_default("http.host", "127.0.0.1");
    config.set_default("http.port", "3036");
    config.set_default("blob.backend", "memory");
    config.set_default("blob.region", "us-east-1");
    config.set_default("blob.public_base_url", "memory://assets");
    config.set_default("blob.folder", "blog");
    config.set_default("blob.max_photo_bytes", DEFAULT_MAX_PHOTO_BYTES.to_string());
}

/// Config from the process environment on top of the defaults.
pub fn config_from_env() -> QuillConfig {
    let mut config = QuillConfig::new();
    config.load_env(ENV_PREFIX);
    apply_defaults(&mut config);
    config
}

pub async fn build(mut config: QuillConfig) -> Result<QuillApp> {
    apply_defaults(&mut config);
    let config = config.snapshot();

    let assets = asset_gateway(&config).await?;
    let blog = BlogLifecycle::new(MemoryRecordStore::new(), assets);

    let router = rest::router(blog.clone(), body_limit(&config)?);
    Ok(QuillApp {
        config,
        blog,
        router,
    })
}

pub async fn asset_gateway(config: &QuillConfigSnapshot) -> Result<AssetGateway> {
    let blob = blob_config(config)?;

    match config.get_or("blob.backend", "memory").as_str() {
        "memory" => Ok(AssetGateway::new(MemoryBlobStore::new(), blob)),
        "s3" => {
            let store = S3CompatibleStore::connect(s3_config(config)?)
                .await
                .context("connecting to the S3 photo store")?;
            Ok(AssetGateway::new(store, blob))
        }
        other => bail!("unknown blob.backend '{other}' (expected 'memory' or 's3')"),
    }
}

fn blob_config(config: &QuillConfigSnapshot) -> Result<BlobConfig> {
    let mut blob = BlobConfig::new()
        .with_public_base_url(config.get_or("blob.public_base_url", "memory://assets"))
        .with_max_photo_bytes(max_photo_bytes(config)? as u64);

    blob = match config.get("blob.folder").map(str::trim) {
        Some("") => blob.without_folder(),
        Some(folder) => blob.with_folder(folder),
        None => blob,
    };
    Ok(blob)
}

fn s3_config(config: &QuillConfigSnapshot) -> Result<S3Config> {
    let bucket = config
        .get_string("blob.bucket")
        .context("blob.bucket is required for the s3 backend")?;

    let mut s3 = S3Config::new(bucket).with_region(config.get_or("blob.region", "us-east-1"));
    if let Some(endpoint) = config.get_string("blob.endpoint") {
        s3 = s3.with_endpoint(endpoint);
    }
    if let (Some(key), Some(secret)) = (
        config.get_string("blob.access_key_id"),
        config.get_string("blob.secret_access_key"),
    ) {
        s3 = s3.with_credentials(key, secret);
    }
    if let Some(secs) = config.get_usize("blob.timeout_secs") {
        s3 = s3.with_operation_timeout(Duration::from_secs(secs as u64));
    }
    Ok(s3)
}

fn max_photo_bytes(config: &QuillConfigSnapshot) -> Result<usize> {
    match config.get("blob.max_photo_bytes") {
        None => Ok(DEFAULT_MAX_PHOTO_BYTES),
        Some(_) => config
            .get_usize("blob.max_photo_bytes")
            .context("blob.max_photo_bytes must be a number of bytes"),
    }
}

/// Base64 grows the photo by a third; the rest of the body is small.
fn body_limit(config: &QuillConfigSnapshot) -> Result<usize> {
    Ok(max_photo_bytes(config)? / 3 * 4 + 64 * 1024)
}
