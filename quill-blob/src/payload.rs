//! Decoding of photo payloads supplied by callers.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::{BlobError, BlobResult, PhotoPayload};

/// Decode a `data:<mime>;base64,<data>` URL into a photo payload.
///
/// Only base64 data URLs with an `image/*` media type are accepted.
pub fn decode_data_url(input: &str) -> BlobResult<PhotoPayload> {
    let rest = input
        .trim()
        .strip_prefix("data:")
        .ok_or_else(|| BlobError::invalid("photo must be a data URL"))?;

    let (header, encoded) = rest
        .split_once(',')
        .ok_or_else(|| BlobError::invalid("photo data URL has no payload"))?;

    let mut parts = header.split(';');
    let mime = parts.next().unwrap_or_default().trim().to_ascii_lowercase();
    if !parts.any(|p| p.trim().eq_ignore_ascii_case("base64")) {
        return Err(BlobError::invalid("photo data URL must be base64 encoded"));
    }

    ensure_image(&mime)?;

    let data = STANDARD
        .decode(encoded.trim())
        .map_err(|e| BlobError::invalid(format!("photo is not valid base64: {e}")))?;

    if data.is_empty() {
        return Err(BlobError::invalid("photo is empty"));
    }

    Ok(PhotoPayload::new(mime, data))
}

/// Reject media types that are not images.
pub fn ensure_image(content_type: &str) -> BlobResult<()> {
    let subtype = content_type
        .strip_prefix("image/")
        .ok_or_else(|| BlobError::invalid(format!("unsupported photo type '{content_type}'")))?;

    if subtype.is_empty() {
        return Err(BlobError::invalid("photo media type has no subtype"));
    }
    Ok(())
}
