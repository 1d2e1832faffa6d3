//! # quill-posts: blog post lifecycle
//!
//! Keeps three things consistent without a shared transaction:
//! the photo asset in the object store, the post record, and the post's
//! comments.
//!
//! ```rust
//! use quill_blob::{AssetGateway, BlobConfig, MemoryBlobStore, PhotoPayload};
//! use quill_core::ObjectId;
//! use quill_posts::{BlogLifecycle, CreatePost, MemoryRecordStore};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), quill_posts::LifecycleError> {
//! let blog = BlogLifecycle::new(
//!     MemoryRecordStore::new(),
//!     AssetGateway::new(MemoryBlobStore::new(), BlobConfig::default()),
//! );
//!
//! let post = blog
//!     .create(CreatePost::new(
//!         "Hello",
//!         ObjectId::new(),
//!         "World",
//!         PhotoPayload::new("image/png", &b"png"[..]),
//!     ))
//!     .await?;
//!
//! blog.delete(post.id.as_str()).await?;
//! # Ok(())
//! # }
//! ```

mod commands;
pub mod error;
pub mod events;
mod lifecycle;
pub mod models;
pub mod projection;
pub mod records;
pub mod schema;

pub use commands::{AddComment, CreatePost, UpdatePost};
pub use error::{LifecycleError, LifecycleResult};
pub use events::{LifecycleEvent, LifecycleEvents, OrphanReason};
pub use lifecycle::BlogLifecycle;
pub use models::{Author, BlogPost, Comment, NewComment, PhotoRef, PostFields, ReplacedPost};
pub use projection::{AuthorProfile, CommentView, PostDetail, PostSummary};
pub use records::{MemoryRecordStore, RecordStore, StoreError, StoreOp};
