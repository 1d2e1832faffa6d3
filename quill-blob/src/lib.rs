//! # quill-blob: photo asset storage
//!
//! `quill-blob` stores the photos attached to blog posts in an external
//! object store and hands back a durable access URL plus the store's
//! canonical asset id.
//!
//! ## Quick Start
//!
//! ```rust
//! use quill_blob::prelude::*;
//!
//! # #[tokio::main]
//! # async fn main() -> BlobResult<()> {
//! let store = MemoryBlobStore::new();
//! let gateway = AssetGateway::new(store, BlobConfig::default());
//!
//! let photo = quill_blob::decode_data_url("data:image/png;base64,aGVsbG8=")?;
//! let receipt = gateway.upload(photo).await?;
//!
//! gateway.remove(&receipt.asset_id).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │   Lifecycle     │  ← consistency policy
//! ├─────────────────┤
//! │  AssetGateway   │  ← payload checks, key layout, access URLs
//! ├─────────────────┤
//! │   BlobStore     │  ← storage primitives (memory, S3-compatible)
//! └─────────────────┘
//! ```

pub mod adapter;
pub mod codec;
mod config;
mod error;
mod memory_store;
mod payload;
mod receipt;
mod s3_store;
pub mod store;
mod types;

pub use adapter::AssetGateway;
pub use config::BlobConfig;
pub use error::{BlobError, BlobResult};
pub use memory_store::MemoryBlobStore;
pub use payload::{decode_data_url, ensure_image};
pub use receipt::AssetReceipt;
pub use s3_store::{S3CompatibleStore, S3Config};
pub use store::{BlobKeyStrategy, BlobStore, DefaultKeyStrategy, ObjectHead, PutResult};
pub use types::{AssetId, ByteStream, PhotoPayload};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        AssetGateway, AssetId, AssetReceipt, BlobConfig, BlobError, BlobResult, BlobStore,
        MemoryBlobStore, PhotoPayload,
    };
}
