use bytes::Bytes;
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use uuid::Uuid;

/// Stream of bytes for blob content
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send>>;

/// Canonical identifier of an asset in the object store.
///
/// This is the bare id, without any folder prefix or extension; the
/// object key is derived from it by a `BlobKeyStrategy`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(pub String);

impl AssetId {
    /// Generate a new random asset ID
    pub fn new() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn from_string(id: String) -> Self {
        Self(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for AssetId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AssetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A decoded photo ready to be uploaded.
#[derive(Debug, Clone)]
pub struct PhotoPayload {
    pub content_type: String,
    pub data: Bytes,
}

impl PhotoPayload {
    pub fn new<S: Into<String>>(content_type: S, data: impl Into<Bytes>) -> Self {
        Self {
            content_type: content_type.into(),
            data: data.into(),
        }
    }

    pub fn len(&self) -> u64 {
        self.data.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Single-chunk stream over the payload bytes.
    pub fn into_stream(self) -> ByteStream {
        let data = self.data;
        Box::pin(futures::stream::once(async move { Ok(data) }))
    }
}
