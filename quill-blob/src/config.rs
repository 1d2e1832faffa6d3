/// Configuration for the asset gateway
#[derive(Debug, Clone)]
pub struct BlobConfig {
    /// Largest photo accepted for upload
    pub max_photo_bytes: u64,

    /// Base of every access URL handed out, e.g. `https://cdn.example.com/photos`
    pub public_base_url: String,

    /// Folder prefix for object keys (`None` stores at the bucket root)
    pub folder: Option<String>,
}

impl Default for BlobConfig {
    fn default() -> Self {
        Self {
            max_photo_bytes: 10 * 1024 * 1024, // 10MB
            public_base_url: "memory://assets".to_string(),
            folder: Some("blog".to_string()),
        }
    }
}

impl BlobConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_photo_bytes(mut self, bytes: u64) -> Self {
        self.max_photo_bytes = bytes;
        self
    }

    pub fn with_public_base_url<S: Into<String>>(mut self, url: S) -> Self {
        self.public_base_url = url.into();
        self
    }

    pub fn with_folder<S: Into<String>>(mut self, folder: S) -> Self {
        self.folder = Some(folder.into());
        self
    }

    /// Store objects at the bucket root.
    pub fn without_folder(mut self) -> Self {
        self.folder = None;
        self
    }

    /// Access URL for an object key.
    pub fn access_url(&self, key: &str) -> String {
        format!(
            "{}/{}",
            self.public_base_url.trim_end_matches('/'),
            key.trim_start_matches('/')
        )
    }
}
