use quill_blob::PhotoPayload;
use quill_core::ObjectId;

use crate::error::{LifecycleError, LifecycleResult};

/// Input to [`BlogLifecycle::create`](crate::BlogLifecycle::create).
#[derive(Debug, Clone)]
pub struct CreatePost {
    pub title: String,
    pub author: ObjectId,
    pub content: String,
    pub photo: PhotoPayload,
}

impl CreatePost {
    pub fn new(
        title: impl Into<String>,
        author: ObjectId,
        content: impl Into<String>,
        photo: PhotoPayload,
    ) -> Self {
        Self {
            title: title.into(),
            author,
            content: content.into(),
            photo,
        }
    }

    pub(crate) fn check(&self) -> LifecycleResult<()> {
        require_text("title", &self.title)?;
        require_text("content", &self.content)
    }
}

/// Input to [`BlogLifecycle::update`](crate::BlogLifecycle::update).
///
/// `photo: None` keeps the current photo. `expected_version` makes the
/// replace conditional on the stored version.
#[derive(Debug, Clone)]
pub struct UpdatePost {
    pub title: String,
    pub author: ObjectId,
    pub content: String,
    pub photo: Option<PhotoPayload>,
    pub expected_version: Option<u64>,
}

impl UpdatePost {
    pub fn new(title: impl Into<String>, author: ObjectId, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            author,
            content: content.into(),
            photo: None,
            expected_version: None,
        }
    }

    pub fn with_photo(mut self, photo: PhotoPayload) -> Self {
        self.photo = Some(photo);
        self
    }

    pub fn with_expected_version(mut self, version: u64) -> Self {
        self.expected_version = Some(version);
        self
    }

    pub(crate) fn check(&self) -> LifecycleResult<()> {
        require_text("title", &self.title)?;
        require_text("content", &self.content)
    }
}

/// Input to [`BlogLifecycle::add_comment`](crate::BlogLifecycle::add_comment).
#[derive(Debug, Clone)]
pub struct AddComment {
    pub author: ObjectId,
    pub text: String,
}

impl AddComment {
    pub fn new(author: ObjectId, text: impl Into<String>) -> Self {
        Self {
            author,
            text: text.into(),
        }
    }

    pub(crate) fn check(&self) -> LifecycleResult<()> {
        require_text("text", &self.text)
    }
}

fn require_text(field: &str, value: &str) -> LifecycleResult<()> {
    if value.trim().is_empty() {
        return Err(LifecycleError::invalid_field(
            field,
            format!("{field} must not be empty"),
        ));
    }
    Ok(())
}

/// Parse a caller-supplied post id.
pub(crate) fn parse_post_id(id: &str) -> LifecycleResult<ObjectId> {
    ObjectId::parse(id).map_err(|_| {
        LifecycleError::invalid_field("id", format!("'{id}' is not a valid post id"))
    })
}
