//! Document store access for posts, comments and authors.

mod memory;

use async_trait::async_trait;
use quill_core::ObjectId;
use thiserror::Error;

use crate::models::{Author, BlogPost, Comment, NewComment, PhotoRef, PostFields, ReplacedPost};

pub use memory::{MemoryRecordStore, StoreOp};

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{collection} not found: {id}")]
    NotFound { collection: &'static str, id: String },

    #[error("post {id} is at version {actual}, expected {expected}")]
    Conflict { id: String, expected: u64, actual: u64 },

    #[error("document store unavailable: {message}")]
    Unavailable { message: String },

    #[error("document store error: {source}")]
    Backend {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl StoreError {
    pub fn not_found(collection: &'static str, id: &ObjectId) -> Self {
        Self::NotFound {
            collection,
            id: id.to_string(),
        }
    }

    pub fn unavailable<S: Into<String>>(message: S) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    pub fn backend<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Backend {
            source: Box::new(error),
        }
    }
}

/// CRUD over the `posts`, `comments` and `users` collections.
///
/// Ids reaching the store are already well-formed; the store never
/// validates them.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn find_post(&self, id: &ObjectId) -> StoreResult<Option<BlogPost>>;

    /// All posts in insertion order.
    async fn find_posts(&self) -> StoreResult<Vec<BlogPost>>;

    /// Assign id, timestamps and version 1.
    async fn insert_post(&self, fields: PostFields, photo: PhotoRef) -> StoreResult<BlogPost>;

    /// Replace the text fields, and the photo when one is given, in one
    /// write. With `photo: None` the stored `photo` and `photo_id` are left
    /// as they are at write time.
    ///
    /// Returns the record as it was immediately before the write, so the
    /// caller knows which photo was displaced.
    ///
    /// With `expected_version`, the write only happens if the stored
    /// version still matches; otherwise `StoreError::Conflict`.
    async fn replace_post(
        &self,
        id: &ObjectId,
        fields: PostFields,
        photo: Option<PhotoRef>,
        expected_version: Option<u64>,
    ) -> StoreResult<ReplacedPost>;

    async fn delete_post(&self, id: &ObjectId) -> StoreResult<()>;

    /// Remove every comment of a post, returning how many were removed.
    async fn delete_comments_by_post(&self, post: &ObjectId) -> StoreResult<u64>;

    async fn insert_comment(&self, post: &ObjectId, comment: NewComment) -> StoreResult<Comment>;

    async fn find_comments_by_post(&self, post: &ObjectId) -> StoreResult<Vec<Comment>>;

    async fn find_author(&self, id: &ObjectId) -> StoreResult<Option<Author>>;

    async fn insert_author(&self, author: Author) -> StoreResult<Author>;
}
