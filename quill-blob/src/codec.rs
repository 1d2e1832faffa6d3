//! Recovering an asset id from an access URL.
//!
//! This is a fallback for records that persisted only the access URL.
//! Records written by the gateway carry the asset id alongside the URL and
//! never need it.

use crate::{AssetId, BlobError, BlobResult};

/// Derive the asset id from an access URL.
///
/// The last non-empty path segment, minus its file extension, is taken as
/// the id. Query strings and fragments are ignored.
///
/// # Precondition
///
/// The asset must have been stored with the bare id as the final path
/// segment. A custom public id containing `/` is silently truncated to its
/// last component, and the folder prefix is not recovered: the caller has
/// to rebuild the object key from the current key strategy. If the folder
/// configuration changed since upload, the derived id addresses the wrong
/// object.
pub fn decode(access_url: &str) -> BlobResult<AssetId> {
    let path = access_url
        .split(['?', '#'])
        .next()
        .unwrap_or_default();

    let path = match path.split_once("://") {
        Some((_, rest)) => rest.split_once('/').map(|(_, p)| p).unwrap_or_default(),
        None => path,
    };

    let segment = path
        .rsplit('/')
        .find(|s| !s.is_empty())
        .ok_or_else(|| BlobError::invalid(format!("no asset id in '{access_url}'")))?;

    let id = match segment.rsplit_once('.') {
        Some((stem, _ext)) if !stem.is_empty() => stem,
        _ => segment,
    };

    Ok(AssetId::from_string(id.to_string()))
}
