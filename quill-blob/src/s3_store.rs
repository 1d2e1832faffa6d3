use std::time::Duration;

use async_trait::async_trait;
use aws_config::timeout::TimeoutConfig;
use aws_config::{BehaviorVersion, Region};
use aws_credential_types::Credentials;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::{primitives::ByteStream as AwsByteStream, Client};
use futures_util::StreamExt;

use crate::{BlobError, BlobResult, BlobStore, ByteStream, ObjectHead, PutResult};

/// Connection settings for an S3-compatible object store
/// (AWS S3, RustFS, MinIO, SeaweedFS).
#[derive(Debug, Clone)]
pub struct S3Config {
    pub bucket: String,
    pub region: String,
    pub endpoint_url: Option<String>,
    pub access_key_id: String,
    pub secret_access_key: String,
    /// Path-style addressing; required by most self-hosted S3 servers.
    pub force_path_style: bool,
    pub operation_timeout: Duration,
}

impl S3Config {
    pub fn new<S: Into<String>>(bucket: S) -> Self {
        Self {
            bucket: bucket.into(),
            region: "us-east-1".to_string(),
            endpoint_url: None,
            access_key_id: String::new(),
            secret_access_key: String::new(),
            force_path_style: true,
            operation_timeout: Duration::from_secs(30),
        }
    }

    pub fn with_region<S: Into<String>>(mut self, region: S) -> Self {
        self.region = region.into();
        self
    }

    pub fn with_endpoint<S: Into<String>>(mut self, endpoint: S) -> Self {
        self.endpoint_url = Some(endpoint.into());
        self
    }

    pub fn with_credentials<A: Into<String>, S: Into<String>>(mut self, access_key_id: A, secret: S) -> Self {
        self.access_key_id = access_key_id.into();
        self.secret_access_key = secret.into();
        self
    }

    pub fn with_operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = timeout;
        self
    }

    fn validate(&self) -> BlobResult<()> {
        if self.bucket.trim().is_empty() {
            return Err(BlobError::invalid("S3 bucket must be configured"));
        }
        if self.access_key_id.is_empty() || self.secret_access_key.is_empty() {
            return Err(BlobError::invalid("S3 credentials must be configured"));
        }
        Ok(())
    }
}

/// Blob store backed by an S3-compatible service via the AWS SDK.
#[derive(Clone)]
pub struct S3CompatibleStore {
    client: Client,
    bucket: String,
}

impl S3CompatibleStore {
    pub async fn connect(config: S3Config) -> BlobResult<Self> {
        config.validate()?;
        let bucket = config.bucket.clone();
        let client = Self::create_client(config).await;
        Ok(Self { client, bucket })
    }

    async fn create_client(config: S3Config) -> Client {
        let credentials = Credentials::new(
            config.access_key_id,
            config.secret_access_key,
            None,
            None,
            "quill",
        );

        let timeouts = TimeoutConfig::builder()
            .operation_timeout(config.operation_timeout)
            .build();

        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region))
            .credentials_provider(credentials)
            .timeout_config(timeouts);

        if let Some(endpoint) = config.endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }

        let aws_config = loader.load().await;

        Client::from_conf(
            aws_sdk_s3::config::Builder::from(&aws_config)
                .force_path_style(config.force_path_style)
                .build(),
        )
    }

    async fn collect_stream(stream: &mut ByteStream) -> BlobResult<Vec<u8>> {
        let mut data = Vec::new();
        while let Some(chunk) = stream.next().await {
            data.extend_from_slice(&chunk?);
        }
        Ok(data)
    }

    /// Timeouts and connection failures mean the store could not be
    /// reached; everything else is a backend error.
    fn map_sdk_error<E, R>(err: SdkError<E, R>) -> BlobError
    where
        E: std::error::Error + Send + Sync + 'static,
        R: std::fmt::Debug + Send + Sync + 'static,
    {
        match err {
            SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) => {
                BlobError::unavailable(DisplayErrorContext(&err).to_string())
            }
            other => BlobError::backend(other),
        }
    }
}

#[async_trait]
impl BlobStore for S3CompatibleStore {
    async fn put(
        &self,
        key: &str,
        content_type: Option<&str>,
        mut stream: ByteStream,
    ) -> BlobResult<PutResult> {
        let data = Self::collect_stream(&mut stream).await?;
        let size_bytes = data.len() as u64;

        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(AwsByteStream::from(data));

        if let Some(ct) = content_type {
            request = request.content_type(ct);
        }

        request.send().await.map_err(Self::map_sdk_error)?;

        Ok(PutResult { size_bytes })
    }

    async fn head(&self, key: &str) -> BlobResult<ObjectHead> {
        let result = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await;

        match result {
            Ok(head) => Ok(ObjectHead {
                size_bytes: head.content_length.unwrap_or(0) as u64,
                content_type: head.content_type,
            }),
            Err(err) => {
                let missing = err
                    .as_service_error()
                    .map(|e| e.is_not_found())
                    .unwrap_or(false);
                if missing {
                    Err(BlobError::not_found(key))
                } else {
                    Err(Self::map_sdk_error(err))
                }
            }
        }
    }

    async fn delete(&self, key: &str) -> BlobResult<()> {
        let result = self
            .client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await;

        match result {
            Ok(_) => Ok(()),
            // S3 itself answers 204 for missing keys; some compatible servers do not.
            Err(err) if matches!(err.code(), Some("NoSuchKey") | Some("NotFound")) => Ok(()),
            Err(err) => Err(Self::map_sdk_error(err)),
        }
    }
}
