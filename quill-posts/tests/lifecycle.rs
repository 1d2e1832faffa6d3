use std::sync::Arc;

use async_trait::async_trait;
use quill_blob::{AssetGateway, BlobConfig, MemoryBlobStore, PhotoPayload};
use quill_core::ObjectId;
use quill_posts::records::StoreResult;
use quill_posts::{
    AddComment, Author, BlogLifecycle, BlogPost, Comment, CreatePost, LifecycleError,
    LifecycleEvent, MemoryRecordStore, NewComment, OrphanReason, PhotoRef, PostFields,
    RecordStore, ReplacedPost, StoreOp, UpdatePost,
};
use tokio::sync::Notify;

const AUTHOR: &str = "507f1f77bcf86cd799439011";

struct Harness {
    blog: BlogLifecycle,
    records: MemoryRecordStore,
    assets: MemoryBlobStore,
}

fn harness() -> Harness {
    let records = MemoryRecordStore::new();
    let assets = MemoryBlobStore::new();
    let blog = BlogLifecycle::new(
        records.clone(),
        AssetGateway::new(assets.clone(), config()),
    );
    Harness {
        blog,
        records,
        assets,
    }
}

fn author() -> ObjectId {
    ObjectId::parse(AUTHOR).unwrap()
}

fn photo(tag: &str) -> PhotoPayload {
    PhotoPayload::new("image/png", tag.as_bytes().to_vec())
}

fn hello() -> CreatePost {
    CreatePost::new("Hello", author(), "World", photo("first"))
}

fn key_of(url: &str) -> String {
    url.trim_start_matches("https://cdn.example.com/").to_string()
}

fn config() -> BlobConfig {
    BlobConfig::new().with_public_base_url("https://cdn.example.com")
}

/// Rewrite a stored post as if it predates persisted asset ids.
async fn forget_photo_id(records: &MemoryRecordStore, id: &ObjectId) {
    let stored = records.find_post(id).await.unwrap().unwrap();
    records
        .replace_post(
            id,
            PostFields {
                title: stored.title,
                author: stored.author,
                content: stored.content,
            },
            Some(PhotoRef {
                url: stored.photo,
                asset_id: None,
            }),
            None,
        )
        .await
        .unwrap();
}

/// Holds photo-less replaces until released, so another writer can land
/// between the lifecycle's read and its write.
#[derive(Clone)]
struct GatedRecords {
    inner: MemoryRecordStore,
    entered: Arc<Notify>,
    release: Arc<Notify>,
}

impl GatedRecords {
    fn new(inner: MemoryRecordStore) -> Self {
        Self {
            inner,
            entered: Arc::new(Notify::new()),
            release: Arc::new(Notify::new()),
        }
    }
}

#[async_trait]
impl RecordStore for GatedRecords {
    async fn find_post(&self, id: &ObjectId) -> StoreResult<Option<BlogPost>> {
        self.inner.find_post(id).await
    }

    async fn find_posts(&self) -> StoreResult<Vec<BlogPost>> {
        self.inner.find_posts().await
    }

    async fn insert_post(&self, fields: PostFields, photo: PhotoRef) -> StoreResult<BlogPost> {
        self.inner.insert_post(fields, photo).await
    }

    async fn replace_post(
        &self,
        id: &ObjectId,
        fields: PostFields,
        photo: Option<PhotoRef>,
        expected_version: Option<u64>,
    ) -> StoreResult<ReplacedPost> {
        if photo.is_none() {
            self.entered.notify_one();
            self.release.notified().await;
        }
        self.inner
            .replace_post(id, fields, photo, expected_version)
            .await
    }

    async fn delete_post(&self, id: &ObjectId) -> StoreResult<()> {
        self.inner.delete_post(id).await
    }

    async fn delete_comments_by_post(&self, post: &ObjectId) -> StoreResult<u64> {
        self.inner.delete_comments_by_post(post).await
    }

    async fn insert_comment(&self, post: &ObjectId, comment: NewComment) -> StoreResult<Comment> {
        self.inner.insert_comment(post, comment).await
    }

    async fn find_comments_by_post(&self, post: &ObjectId) -> StoreResult<Vec<Comment>> {
        self.inner.find_comments_by_post(post).await
    }

    async fn find_author(&self, id: &ObjectId) -> StoreResult<Option<Author>> {
        self.inner.find_author(id).await
    }

    async fn insert_author(&self, author: Author) -> StoreResult<Author> {
        self.inner.insert_author(author).await
    }
}

#[tokio::test]
async fn create_then_fetch_returns_same_post() {
    let h = harness();

    let created = h.blog.create(hello()).await.unwrap();
    assert!(!created.photo.is_empty());
    assert!(h.assets.contains(&key_of(&created.photo)).await);

    let fetched = h.blog.get_by_id(created.id.as_str()).await.unwrap();
    assert_eq!(fetched.title, "Hello");
    assert_eq!(fetched.content, "World");
    assert_eq!(fetched.photo, created.photo);
    assert_eq!(fetched.author.id, author());
}

#[tokio::test]
async fn detail_expands_known_author() {
    let h = harness();
    h.records
        .insert_author(Author {
            id: author(),
            name: "Ada".into(),
            avatar: Some("https://cdn.example.com/ada.png".into()),
        })
        .await
        .unwrap();

    let created = h.blog.create(hello()).await.unwrap();
    let detail = h.blog.get_by_id(created.id.as_str()).await.unwrap();
    assert_eq!(detail.author.name.as_deref(), Some("Ada"));
}

#[tokio::test]
async fn upload_failure_on_create_writes_nothing() {
    let h = harness();
    h.assets.fail_puts(true);

    let err = h.blog.create(hello()).await.unwrap_err();
    assert!(matches!(err, LifecycleError::AssetStore(_)));
    assert!(h.records.find_posts().await.unwrap().is_empty());
    assert_eq!(h.records.mutation_count(), 0);
}

#[tokio::test]
async fn insert_failure_reports_orphaned_photo() {
    let h = harness();
    let mut events = h.blog.events().subscribe();
    h.records.fail(StoreOp::InsertPost, true);

    let err = h.blog.create(hello()).await.unwrap_err();
    assert!(matches!(err, LifecycleError::Store(_)));

    // No compensating delete: the photo stays and is reported.
    assert_eq!(h.assets.len().await, 1);
    assert_eq!(h.assets.delete_count(), 0);
    match events.recv().await.unwrap() {
        LifecycleEvent::AssetOrphaned {
            post,
            asset_id,
            reason,
            ..
        } => {
            assert!(post.is_none());
            assert!(asset_id.is_some());
            assert_eq!(reason, OrphanReason::InsertFailed);
        }
        other => panic!("unexpected event {other:?}"),
    }
}

#[tokio::test]
async fn update_with_new_photo_uploads_first_then_removes_old() {
    let h = harness();
    let created = h.blog.create(hello()).await.unwrap();
    let puts_before = h.assets.put_count();

    let updated = h
        .blog
        .update(
            created.id.as_str(),
            UpdatePost::new("Hello again", author(), "World 2").with_photo(photo("second")),
        )
        .await
        .unwrap();

    assert_eq!(h.assets.put_count() - puts_before, 1);
    assert_eq!(h.assets.delete_count(), 1);
    assert_ne!(updated.photo, created.photo);
    assert!(h.assets.contains(&key_of(&updated.photo)).await);
    assert!(!h.assets.contains(&key_of(&created.photo)).await);

    let stored = h.blog.get_by_id(created.id.as_str()).await.unwrap();
    assert_eq!(stored.photo, updated.photo);
    assert_eq!(stored.title, "Hello again");
}

#[tokio::test]
async fn update_without_photo_keeps_photo() {
    let h = harness();
    let created = h.blog.create(hello()).await.unwrap();

    let updated = h
        .blog
        .update(created.id.as_str(), UpdatePost::new("New title", author(), "New body"))
        .await
        .unwrap();

    assert_eq!(updated.photo, created.photo);
    assert_eq!(updated.title, "New title");
    assert_eq!(updated.content, "New body");
    assert_eq!(h.assets.put_count(), 1);
    assert_eq!(h.assets.delete_count(), 0);
}

#[tokio::test]
async fn upload_failure_on_update_leaves_post_and_old_photo() {
    let h = harness();
    let created = h.blog.create(hello()).await.unwrap();
    h.assets.fail_puts(true);

    let err = h
        .blog
        .update(
            created.id.as_str(),
            UpdatePost::new("changed", author(), "changed").with_photo(photo("second")),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, LifecycleError::AssetStore(_)));

    let stored = h.blog.get_by_id(created.id.as_str()).await.unwrap();
    assert_eq!(stored.title, "Hello");
    assert_eq!(stored.photo, created.photo);
    assert!(h.assets.contains(&key_of(&created.photo)).await);
    assert_eq!(h.assets.delete_count(), 0);
}

#[tokio::test]
async fn old_photo_removal_failure_is_swallowed() {
    let h = harness();
    let created = h.blog.create(hello()).await.unwrap();
    let mut events = h.blog.events().subscribe();
    h.assets.fail_deletes(true);

    let updated = h
        .blog
        .update(
            created.id.as_str(),
            UpdatePost::new("Hello", author(), "World").with_photo(photo("second")),
        )
        .await
        .unwrap();
    assert_ne!(updated.photo, created.photo);

    match events.recv().await.unwrap() {
        LifecycleEvent::AssetOrphaned {
            post,
            access_url,
            reason,
            ..
        } => {
            assert_eq!(post, Some(created.id.clone()));
            assert_eq!(access_url, created.photo);
            assert_eq!(reason, OrphanReason::ReplacedAssetKept);
        }
        other => panic!("unexpected event {other:?}"),
    }
    assert!(matches!(
        events.recv().await.unwrap(),
        LifecycleEvent::PostUpdated {
            photo_replaced: true,
            ..
        }
    ));
}

#[tokio::test]
async fn replace_failure_orphans_new_photo_and_keeps_old() {
    let h = harness();
    let created = h.blog.create(hello()).await.unwrap();
    let mut events = h.blog.events().subscribe();
    h.records.fail(StoreOp::ReplacePost, true);

    let err = h
        .blog
        .update(
            created.id.as_str(),
            UpdatePost::new("x", author(), "y").with_photo(photo("second")),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, LifecycleError::Store(_)));

    assert!(h.assets.contains(&key_of(&created.photo)).await);
    assert_eq!(h.assets.delete_count(), 0);
    assert!(matches!(
        events.recv().await.unwrap(),
        LifecycleEvent::AssetOrphaned {
            reason: OrphanReason::ReplaceFailed,
            ..
        }
    ));
}

#[tokio::test]
async fn stale_version_is_a_conflict() {
    let h = harness();
    let created = h.blog.create(hello()).await.unwrap();

    h.blog
        .update(
            created.id.as_str(),
            UpdatePost::new("v2", author(), "body").with_expected_version(1),
        )
        .await
        .unwrap();

    let err = h
        .blog
        .update(
            created.id.as_str(),
            UpdatePost::new("v3", author(), "body")
                .with_photo(photo("late"))
                .with_expected_version(1),
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        LifecycleError::Conflict {
            expected: 1,
            actual: 2,
            ..
        }
    ));

    // Rejected before any upload.
    assert_eq!(h.assets.put_count(), 1);
    let stored = h.blog.get_by_id(created.id.as_str()).await.unwrap();
    assert_eq!(stored.title, "v2");
}

#[tokio::test]
async fn update_of_missing_post_is_not_found() {
    let h = harness();
    let err = h
        .blog
        .update(
            &ObjectId::new().to_string(),
            UpdatePost::new("t", author(), "c").with_photo(photo("p")),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, LifecycleError::NotFound { .. }));
    assert_eq!(h.assets.put_count(), 0);
    assert_eq!(h.records.mutation_count(), 0);
}

#[tokio::test]
async fn delete_removes_post_photo_and_all_comments() {
    let h = harness();
    let created = h.blog.create(hello()).await.unwrap();
    let other = h.blog.create(hello()).await.unwrap();

    for text in ["one", "two", "three"] {
        h.blog
            .add_comment(created.id.as_str(), AddComment::new(author(), text))
            .await
            .unwrap();
    }
    h.blog
        .add_comment(other.id.as_str(), AddComment::new(author(), "keep"))
        .await
        .unwrap();
    assert_eq!(h.blog.comments(created.id.as_str()).await.unwrap().len(), 3);

    let mut events = h.blog.events().subscribe();
    h.blog.delete(created.id.as_str()).await.unwrap();

    assert!(h.records.find_post(&created.id).await.unwrap().is_none());
    assert!(h.records.find_comments_by_post(&created.id).await.unwrap().is_empty());
    assert_eq!(h.records.comment_count().await, 1);
    assert!(!h.assets.contains(&key_of(&created.photo)).await);
    assert!(matches!(
        events.recv().await.unwrap(),
        LifecycleEvent::PostDeleted {
            comments_removed: 3,
            ..
        }
    ));
}

#[tokio::test]
async fn delete_of_missing_post_is_not_found_twice_with_no_mutations() {
    let h = harness();
    let missing = ObjectId::new().to_string();

    for _ in 0..2 {
        let err = h.blog.delete(&missing).await.unwrap_err();
        assert!(matches!(err, LifecycleError::NotFound { .. }));
    }
    assert_eq!(h.records.mutation_count(), 0);
    assert_eq!(h.assets.delete_count(), 0);
}

#[tokio::test]
async fn photo_removal_failure_does_not_block_delete() {
    let h = harness();
    let created = h.blog.create(hello()).await.unwrap();
    h.assets.fail_deletes(true);

    h.blog.delete(created.id.as_str()).await.unwrap();
    assert!(h.records.find_post(&created.id).await.unwrap().is_none());
}

#[tokio::test]
async fn cascade_failure_is_a_partial_delete() {
    let h = harness();
    let created = h.blog.create(hello()).await.unwrap();
    h.records.fail(StoreOp::DeleteComments, true);

    let err = h.blog.delete(created.id.as_str()).await.unwrap_err();
    assert!(matches!(err, LifecycleError::PartialDelete { .. }));
}

#[tokio::test]
async fn delete_falls_back_to_decoding_the_photo_url() {
    let h = harness();
    let created = h.blog.create(hello()).await.unwrap();

    forget_photo_id(&h.records, &created.id).await;

    h.blog.delete(created.id.as_str()).await.unwrap();
    assert!(h.assets.is_empty().await);
}

#[tokio::test]
async fn update_falls_back_to_decoding_the_old_photo_url() {
    let h = harness();
    let created = h.blog.create(hello()).await.unwrap();
    forget_photo_id(&h.records, &created.id).await;
    let mut events = h.blog.events().subscribe();

    let updated = h
        .blog
        .update(
            created.id.as_str(),
            UpdatePost::new("Hello", author(), "World").with_photo(photo("second")),
        )
        .await
        .unwrap();

    assert_eq!(h.assets.delete_count(), 1);
    assert!(!h.assets.contains(&key_of(&created.photo)).await);
    assert!(h.assets.contains(&key_of(&updated.photo)).await);
    assert_eq!(h.assets.len().await, 1);

    let stored = h.records.find_post(&created.id).await.unwrap().unwrap();
    assert!(stored.photo_id.is_some());
    assert!(matches!(
        events.recv().await.unwrap(),
        LifecycleEvent::PostUpdated {
            photo_replaced: true,
            ..
        }
    ));
}

#[tokio::test]
async fn text_update_racing_a_photo_swap_keeps_the_new_photo() {
    let records = MemoryRecordStore::new();
    let gated = GatedRecords::new(records.clone());
    let assets = MemoryBlobStore::new();
    let blog = BlogLifecycle::new(gated.clone(), AssetGateway::new(assets.clone(), config()));

    let created = blog.create(hello()).await.unwrap();

    // Reads photo A, then parks inside its replace.
    let text_update = tokio::spawn({
        let blog = blog.clone();
        let id = created.id.to_string();
        async move {
            blog.update(&id, UpdatePost::new("Edited", author(), "Edited body"))
                .await
        }
    });
    gated.entered.notified().await;

    // Swaps A for B and deletes A while the text update is parked.
    let swapped = blog
        .update(
            created.id.as_str(),
            UpdatePost::new("Hello", author(), "World").with_photo(photo("second")),
        )
        .await
        .unwrap();
    assert!(!assets.contains(&key_of(&created.photo)).await);

    gated.release.notify_one();
    let edited = text_update.await.unwrap().unwrap();

    assert_eq!(edited.title, "Edited");
    assert_eq!(edited.photo, swapped.photo);

    let stored = records.find_post(&created.id).await.unwrap().unwrap();
    assert_eq!(stored.photo, swapped.photo);
    assert!(assets.contains(&key_of(&stored.photo)).await);
    assert_eq!(stored.version, 3);
    assert_eq!(assets.len().await, 1);
}

#[tokio::test]
async fn malformed_ids_are_rejected_before_any_io() {
    let h = harness();

    assert!(matches!(
        h.blog.get_by_id("nope").await,
        Err(LifecycleError::Validation { .. })
    ));
    assert!(matches!(
        h.blog.delete("12345").await,
        Err(LifecycleError::Validation { .. })
    ));
    assert_eq!(h.records.mutation_count(), 0);
}

#[tokio::test]
async fn list_returns_summaries_in_insertion_order() {
    let h = harness();
    let a = h.blog.create(hello()).await.unwrap();
    let b = h
        .blog
        .create(CreatePost::new("Second", author(), "Body", photo("b")))
        .await
        .unwrap();

    let ids: Vec<ObjectId> = h.blog.get_all().await.unwrap().into_iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![a.id, b.id]);
}
