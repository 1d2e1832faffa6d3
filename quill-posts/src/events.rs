use quill_blob::AssetId;
use quill_core::ObjectId;
use serde::Serialize;
use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 64;

/// Why an asset ended up with no post referencing it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OrphanReason {
    /// The record insert failed after the photo was uploaded.
    InsertFailed,
    /// The replace failed after the new photo was uploaded.
    ReplaceFailed,
    /// The old photo could not be removed after an update.
    ReplacedAssetKept,
    /// The photo could not be removed while deleting its post.
    DeletedPostAssetKept,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LifecycleEvent {
    PostCreated { id: ObjectId },
    PostUpdated { id: ObjectId, photo_replaced: bool },
    PostDeleted { id: ObjectId, comments_removed: u64 },
    /// Feed for an out-of-band sweep. `post` is `None` when no record was
    /// ever written; `asset_id` is `None` when the id could not be recovered
    /// from the stored URL.
    AssetOrphaned {
        post: Option<ObjectId>,
        asset_id: Option<AssetId>,
        access_url: String,
        reason: OrphanReason,
    },
}

/// Broadcast channel for lifecycle events.
///
/// Sending never fails: with no subscribers the event is dropped, and slow
/// subscribers see `RecvError::Lagged`.
#[derive(Debug, Clone)]
pub struct LifecycleEvents {
    sender: broadcast::Sender<LifecycleEvent>,
}

impl LifecycleEvents {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.sender.subscribe()
    }

    pub(crate) fn emit(&self, event: LifecycleEvent) {
        let _ = self.sender.send(event);
    }
}

impl Default for LifecycleEvents {
    fn default() -> Self {
        Self::new()
    }
}
