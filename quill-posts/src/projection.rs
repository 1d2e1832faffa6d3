//! Response shapes. Pure mapping from stored records; internal fields
//! (`photo_id`, `version`) never leave this crate through here.

use chrono::{DateTime, Utc};
use quill_core::ObjectId;
use serde::Serialize;

use crate::models::{Author, BlogPost, Comment};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostSummary {
    pub id: ObjectId,
    pub title: String,
    pub author: ObjectId,
    pub content: String,
    pub photo: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostDetail {
    pub id: ObjectId,
    pub title: String,
    pub author: AuthorProfile,
    pub content: String,
    pub photo: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Byline. `name` and `avatar` are null when the user is unknown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthorProfile {
    pub id: ObjectId,
    pub name: Option<String>,
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    pub id: ObjectId,
    pub post: ObjectId,
    pub author: ObjectId,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

pub fn project_summary(post: &BlogPost) -> PostSummary {
    PostSummary {
        id: post.id.clone(),
        title: post.title.clone(),
        author: post.author.clone(),
        content: post.content.clone(),
        photo: post.photo.clone(),
        created_at: post.created_at,
        updated_at: post.updated_at,
    }
}

pub fn project_detail(post: &BlogPost, author: Option<&Author>) -> PostDetail {
    let author = match author {
        Some(a) => AuthorProfile {
            id: a.id.clone(),
            name: Some(a.name.clone()),
            avatar: a.avatar.clone(),
        },
        None => AuthorProfile {
            id: post.author.clone(),
            name: None,
            avatar: None,
        },
    };

    PostDetail {
        id: post.id.clone(),
        title: post.title.clone(),
        author,
        content: post.content.clone(),
        photo: post.photo.clone(),
        created_at: post.created_at,
        updated_at: post.updated_at,
    }
}

pub fn project_comment(comment: &Comment) -> CommentView {
    CommentView {
        id: comment.id.clone(),
        post: comment.post.clone(),
        author: comment.author.clone(),
        text: comment.text.clone(),
        created_at: comment.created_at,
    }
}
