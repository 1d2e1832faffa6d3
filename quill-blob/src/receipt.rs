use crate::AssetId;

/// Receipt returned after successfully storing a photo.
///
/// `access_url` is what records persist as the photo reference;
/// `asset_id` is the store's canonical identifier needed to remove it.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetReceipt {
    pub asset_id: AssetId,
    pub access_url: String,
}

impl AssetReceipt {
    pub fn new(asset_id: AssetId, access_url: String) -> Self {
        Self {
            asset_id,
            access_url,
        }
    }
}
