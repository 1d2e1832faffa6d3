use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use quill_core::ObjectId;
use tokio::sync::RwLock;

use super::{RecordStore, StoreError, StoreResult};
use crate::models::{Author, BlogPost, Comment, NewComment, PhotoRef, PostFields, ReplacedPost};

/// Store operations that can be made to fail in tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    FindPost,
    InsertPost,
    ReplacePost,
    DeletePost,
    DeleteComments,
}

#[derive(Default)]
struct BlogState {
    posts: RwLock<Vec<BlogPost>>,
    comments: RwLock<Vec<Comment>>,
    authors: RwLock<HashMap<ObjectId, Author>>,
    failing: Mutex<HashSet<StoreOp>>,
    mutations: AtomicUsize,
}

/// In-memory document store. Clones share state.
#[derive(Clone, Default)]
pub struct MemoryRecordStore {
    state: Arc<BlogState>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `op` fail with `StoreError::Unavailable` until cleared.
    pub fn fail(&self, op: StoreOp, fail: bool) {
        let mut failing = self
            .state
            .failing
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if fail {
            failing.insert(op);
        } else {
            failing.remove(&op);
        }
    }

    /// Number of successful writes of any kind.
    pub fn mutation_count(&self) -> usize {
        self.state.mutations.load(Ordering::SeqCst)
    }

    pub async fn comment_count(&self) -> usize {
        self.state.comments.read().await.len()
    }

    fn check(&self, op: StoreOp) -> StoreResult<()> {
        let failing = self
            .state
            .failing
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if failing.contains(&op) {
            return Err(StoreError::unavailable(format!("{op:?} rejected")));
        }
        Ok(())
    }

    fn mutated(&self) {
        self.state.mutations.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn find_post(&self, id: &ObjectId) -> StoreResult<Option<BlogPost>> {
        self.check(StoreOp::FindPost)?;
        let posts = self.state.posts.read().await;
        Ok(posts.iter().find(|p| &p.id == id).cloned())
    }

    async fn find_posts(&self) -> StoreResult<Vec<BlogPost>> {
        Ok(self.state.posts.read().await.clone())
    }

    async fn insert_post(&self, fields: PostFields, photo: PhotoRef) -> StoreResult<BlogPost> {
        self.check(StoreOp::InsertPost)?;

        let now = Utc::now();
        let post = BlogPost {
            id: ObjectId::new(),
            title: fields.title,
            author: fields.author,
            content: fields.content,
            photo: photo.url,
            photo_id: photo.asset_id,
            version: 1,
            created_at: now,
            updated_at: now,
        };

        self.state.posts.write().await.push(post.clone());
        self.mutated();
        Ok(post)
    }

    async fn replace_post(
        &self,
        id: &ObjectId,
        fields: PostFields,
        photo: Option<PhotoRef>,
        expected_version: Option<u64>,
    ) -> StoreResult<ReplacedPost> {
        self.check(StoreOp::ReplacePost)?;

        let mut posts = self.state.posts.write().await;
        let post = posts
            .iter_mut()
            .find(|p| &p.id == id)
            .ok_or_else(|| StoreError::not_found("post", id))?;

        if let Some(expected) = expected_version {
            if post.version != expected {
                return Err(StoreError::Conflict {
                    id: id.to_string(),
                    expected,
                    actual: post.version,
                });
            }
        }

        let before = post.clone();
        post.title = fields.title;
        post.author = fields.author;
        post.content = fields.content;
        if let Some(photo) = photo {
            post.photo = photo.url;
            post.photo_id = photo.asset_id;
        }
        post.version += 1;
        post.updated_at = Utc::now();

        let after = post.clone();
        drop(posts);
        self.mutated();
        Ok(ReplacedPost { before, after })
    }

    async fn delete_post(&self, id: &ObjectId) -> StoreResult<()> {
        self.check(StoreOp::DeletePost)?;

        let mut posts = self.state.posts.write().await;
        let before = posts.len();
        posts.retain(|p| &p.id != id);
        if posts.len() == before {
            return Err(StoreError::not_found("post", id));
        }
        drop(posts);
        self.mutated();
        Ok(())
    }

    async fn delete_comments_by_post(&self, post: &ObjectId) -> StoreResult<u64> {
        self.check(StoreOp::DeleteComments)?;

        let mut comments = self.state.comments.write().await;
        let before = comments.len();
        comments.retain(|c| &c.post != post);
        let removed = (before - comments.len()) as u64;
        drop(comments);
        self.mutated();
        Ok(removed)
    }

    async fn insert_comment(&self, post: &ObjectId, comment: NewComment) -> StoreResult<Comment> {
        let comment = Comment {
            id: ObjectId::new(),
            post: post.clone(),
            author: comment.author,
            text: comment.text,
            created_at: Utc::now(),
        };
        self.state.comments.write().await.push(comment.clone());
        self.mutated();
        Ok(comment)
    }

    async fn find_comments_by_post(&self, post: &ObjectId) -> StoreResult<Vec<Comment>> {
        let comments = self.state.comments.read().await;
        Ok(comments.iter().filter(|c| &c.post == post).cloned().collect())
    }

    async fn find_author(&self, id: &ObjectId) -> StoreResult<Option<Author>> {
        Ok(self.state.authors.read().await.get(id).cloned())
    }

    async fn insert_author(&self, author: Author) -> StoreResult<Author> {
        self.state
            .authors
            .write()
            .await
            .insert(author.id.clone(), author.clone());
        self.mutated();
        Ok(author)
    }
}
