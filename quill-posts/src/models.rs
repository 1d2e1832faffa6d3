use chrono::{DateTime, Utc};
use quill_blob::AssetId;
use quill_core::ObjectId;
use serde::{Deserialize, Serialize};

/// A stored blog post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlogPost {
    pub id: ObjectId,
    pub title: String,
    pub author: ObjectId,
    pub content: String,
    /// Access URL of the photo asset.
    pub photo: String,
    /// Asset id recorded at upload time. `None` for records that only
    /// persisted the URL; those fall back to decoding it.
    pub photo_id: Option<AssetId>,
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Text fields of a post, as written by insert and replace.
#[derive(Debug, Clone, PartialEq)]
pub struct PostFields {
    pub title: String,
    pub author: ObjectId,
    pub content: String,
}

/// Where a post's photo lives: the access URL plus, when known, the asset id.
#[derive(Debug, Clone, PartialEq)]
pub struct PhotoRef {
    pub url: String,
    pub asset_id: Option<AssetId>,
}

impl PhotoRef {
    pub fn new(url: impl Into<String>, asset_id: AssetId) -> Self {
        Self {
            url: url.into(),
            asset_id: Some(asset_id),
        }
    }
}

/// Outcome of a replace: the record as it was just before the write and
/// as it is now.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplacedPost {
    pub before: BlogPost,
    pub after: BlogPost,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: ObjectId,
    pub post: ObjectId,
    pub author: ObjectId,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewComment {
    pub author: ObjectId,
    pub text: String,
}

/// A user as seen by the blog: just enough to render a byline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Author {
    pub id: ObjectId,
    pub name: String,
    pub avatar: Option<String>,
}
