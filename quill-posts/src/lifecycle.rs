use std::sync::Arc;

use quill_blob::{AssetGateway, AssetId, AssetReceipt};
use quill_core::ObjectId;
use tracing::{info, instrument, warn};

use crate::commands::{parse_post_id, AddComment, CreatePost, UpdatePost};
use crate::error::{LifecycleError, LifecycleResult};
use crate::events::{LifecycleEvent, LifecycleEvents, OrphanReason};
use crate::models::{BlogPost, NewComment, PhotoRef, PostFields};
use crate::projection::{
    project_comment, project_detail, project_summary, CommentView, PostDetail, PostSummary,
};
use crate::records::RecordStore;

/// Sequences photo uploads, record writes and comment cleanup.
///
/// There is no transaction spanning the object store and the document
/// store. The ordering below guarantees a stored post never points at a
/// photo that was removed; the price is that a failed write can leave an
/// asset nobody references, which is logged and reported as
/// [`LifecycleEvent::AssetOrphaned`].
///
/// Every operation is a single pass with no retries.
#[derive(Clone)]
pub struct BlogLifecycle {
    records: Arc<dyn RecordStore>,
    assets: Arc<AssetGateway>,
    events: LifecycleEvents,
}

impl BlogLifecycle {
    pub fn new<R: RecordStore + 'static>(records: R, assets: AssetGateway) -> Self {
        Self::from_parts(Arc::new(records), Arc::new(assets))
    }

    pub fn from_parts(records: Arc<dyn RecordStore>, assets: Arc<AssetGateway>) -> Self {
        Self {
            records,
            assets,
            events: LifecycleEvents::new(),
        }
    }

    pub fn events(&self) -> &LifecycleEvents {
        &self.events
    }

    /// Upload the photo, then insert the post.
    ///
    /// Upload failure aborts with nothing written. Insert failure leaves
    /// the uploaded photo orphaned.
    #[instrument(skip_all, fields(title = %cmd.title))]
    pub async fn create(&self, cmd: CreatePost) -> LifecycleResult<PostSummary> {
        cmd.check()?;

        let receipt = self.assets.upload(cmd.photo).await?;

        let fields = PostFields {
            title: cmd.title,
            author: cmd.author,
            content: cmd.content,
        };

        let post = match self.records.insert_post(fields, photo_ref(&receipt)).await {
            Ok(post) => post,
            Err(err) => {
                warn!(asset_id = %receipt.asset_id, error = %err, "post insert failed, photo orphaned");
                self.orphaned(None, &receipt, OrphanReason::InsertFailed);
                return Err(err.into());
            }
        };

        info!(post_id = %post.id, asset_id = %receipt.asset_id, "post created");
        self.events.emit(LifecycleEvent::PostCreated {
            id: post.id.clone(),
        });
        Ok(project_summary(&post))
    }

    pub async fn get_all(&self) -> LifecycleResult<Vec<PostSummary>> {
        let posts = self.records.find_posts().await?;
        Ok(posts.iter().map(project_summary).collect())
    }

    pub async fn get_by_id(&self, id: &str) -> LifecycleResult<PostDetail> {
        let post = self.load(id).await?;
        let author = self.records.find_author(&post.author).await?;
        Ok(project_detail(&post, author.as_ref()))
    }

    /// Replace title, author and content, and optionally the photo.
    ///
    /// A new photo is uploaded before the record is touched and the old one
    /// is removed only after the record points at the new one. Without a new
    /// photo the stored photo is left untouched by the write, whatever it is
    /// by then.
    #[instrument(skip(self, cmd), fields(new_photo = cmd.photo.is_some()))]
    pub async fn update(&self, id: &str, cmd: UpdatePost) -> LifecycleResult<PostSummary> {
        let post_id = parse_post_id(id)?;
        cmd.check()?;

        let current = self
            .records
            .find_post(&post_id)
            .await?
            .ok_or_else(|| LifecycleError::not_found(&post_id))?;

        if let Some(expected) = cmd.expected_version {
            if expected != current.version {
                return Err(LifecycleError::Conflict {
                    id: post_id.to_string(),
                    expected,
                    actual: current.version,
                });
            }
        }

        let receipt = match cmd.photo {
            Some(photo) => Some(self.assets.upload(photo).await?),
            None => None,
        };

        let fields = PostFields {
            title: cmd.title,
            author: cmd.author,
            content: cmd.content,
        };

        let replaced = match self
            .records
            .replace_post(
                &post_id,
                fields,
                receipt.as_ref().map(photo_ref),
                cmd.expected_version,
            )
            .await
        {
            Ok(replaced) => replaced,
            Err(err) => {
                if let Some(receipt) = &receipt {
                    warn!(post_id = %post_id, asset_id = %receipt.asset_id, error = %err, "post replace failed, new photo orphaned");
                    self.orphaned(Some(post_id.clone()), receipt, OrphanReason::ReplaceFailed);
                }
                return Err(err.into());
            }
        };

        // The displaced photo is the one stored at write time, which may be
        // newer than the one read above.
        let photo_replaced = receipt.is_some();
        if photo_replaced {
            self.discard_asset(&replaced.before, OrphanReason::ReplacedAssetKept)
                .await;
        }

        info!(post_id = %post_id, version = replaced.after.version, photo_replaced, "post updated");
        self.events.emit(LifecycleEvent::PostUpdated {
            id: post_id,
            photo_replaced,
        });
        Ok(project_summary(&replaced.after))
    }

    /// Remove the photo, the post and its comments.
    ///
    /// Photo removal is best effort and never blocks the record delete. The
    /// record delete and the comment cascade both have to succeed; a failed
    /// cascade after the record is gone is reported as `PartialDelete`.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> LifecycleResult<()> {
        let post_id = parse_post_id(id)?;

        let post = self
            .records
            .find_post(&post_id)
            .await?
            .ok_or_else(|| LifecycleError::not_found(&post_id))?;

        self.discard_asset(&post, OrphanReason::DeletedPostAssetKept)
            .await;

        self.records.delete_post(&post_id).await?;

        let comments_removed = self
            .records
            .delete_comments_by_post(&post_id)
            .await
            .map_err(|source| {
                warn!(post_id = %post_id, error = %source, "comment cascade failed");
                LifecycleError::PartialDelete {
                    id: post_id.to_string(),
                    source,
                }
            })?;

        info!(post_id = %post_id, comments_removed, "post deleted");
        self.events.emit(LifecycleEvent::PostDeleted {
            id: post_id,
            comments_removed,
        });
        Ok(())
    }

    pub async fn add_comment(&self, post_id: &str, cmd: AddComment) -> LifecycleResult<CommentView> {
        cmd.check()?;
        let post = self.load(post_id).await?;

        let comment = self
            .records
            .insert_comment(
                &post.id,
                NewComment {
                    author: cmd.author,
                    text: cmd.text,
                },
            )
            .await?;
        Ok(project_comment(&comment))
    }

    pub async fn comments(&self, post_id: &str) -> LifecycleResult<Vec<CommentView>> {
        let post = self.load(post_id).await?;
        let comments = self.records.find_comments_by_post(&post.id).await?;
        Ok(comments.iter().map(project_comment).collect())
    }

    async fn load(&self, id: &str) -> LifecycleResult<BlogPost> {
        let post_id = parse_post_id(id)?;
        self.records
            .find_post(&post_id)
            .await?
            .ok_or_else(|| LifecycleError::not_found(&post_id))
    }

    /// Best-effort removal of the photo a post currently references.
    async fn discard_asset(&self, post: &BlogPost, reason: OrphanReason) {
        let asset_id = match &post.photo_id {
            Some(id) => id.clone(),
            None => match self.assets.resolve_asset_id(&post.photo) {
                Ok(id) => id,
                Err(err) => {
                    warn!(post_id = %post.id, photo = %post.photo, error = %err, "cannot resolve photo asset id");
                    self.emit_orphan(Some(post.id.clone()), None, post.photo.clone(), reason);
                    return;
                }
            },
        };

        if let Err(err) = self.assets.remove(&asset_id).await {
            warn!(post_id = %post.id, asset_id = %asset_id, error = %err, "photo removal failed");
            self.emit_orphan(Some(post.id.clone()), Some(asset_id), post.photo.clone(), reason);
        }
    }

    fn orphaned(&self, post: Option<ObjectId>, receipt: &AssetReceipt, reason: OrphanReason) {
        self.emit_orphan(
            post,
            Some(receipt.asset_id.clone()),
            receipt.access_url.clone(),
            reason,
        );
    }

    fn emit_orphan(
        &self,
        post: Option<ObjectId>,
        asset_id: Option<AssetId>,
        access_url: String,
        reason: OrphanReason,
    ) {
        self.events.emit(LifecycleEvent::AssetOrphaned {
            post,
            asset_id,
            access_url,
            reason,
        });
    }
}

fn photo_ref(receipt: &AssetReceipt) -> PhotoRef {
    PhotoRef::new(receipt.access_url.clone(), receipt.asset_id.clone())
}
