/// Remote object store abstraction and its S3 implementation
///
/// [`ObjectStore`] is the seam between [`super::BlobStorage`] and the
/// network. Production uses [`S3ObjectStore`]; tests substitute in-memory or
/// failing stores.

use std::time::Duration;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::{
    config::{Credentials, Region},
    presigning::PresigningConfig,
    primitives::ByteStream,
    types::ObjectCannedAcl,
    Client,
};
use bytes::Bytes;

use super::StorageError;

/// Minimal object store surface needed by the file service
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Stores `body` under `key` with public-read access, returning its public URL
    async fn put_object(&self, key: &str, body: Bytes, content_type: &str) -> Result<String, StorageError>;

    /// Removes the object under `key`; removing a missing key succeeds
    async fn delete_object(&self, key: &str) -> Result<(), StorageError>;

    /// Produces a time-limited GET URL for `key`
    async fn presign_get(&self, key: &str, expires_in: Duration) -> Result<String, StorageError>;
}

/// S3 connection settings
#[derive(Debug, Clone)]
pub struct S3Config {
    pub bucket: String,
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: String,

    /// Custom endpoint for S3-compatible stores (MinIO, LocalStack);
    /// enables path-style addressing
    pub endpoint: Option<String>,
}

/// [`ObjectStore`] backed by an S3 bucket
#[derive(Clone)]
pub struct S3ObjectStore {
    client: Client,
    bucket: String,
    region: String,
    endpoint: Option<String>,
}

impl S3ObjectStore {
    /// Builds a client from static credentials
    ///
    /// No request is made; credential or bucket problems surface on first use.
    pub async fn new(config: S3Config) -> Self {
        let credentials = Credentials::new(
            config.access_key_id,
            config.secret_access_key,
            None,
            None,
            "workhub",
        );

        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials);

        if let Some(endpoint) = &config.endpoint {
            loader = loader.endpoint_url(endpoint.as_str());
        }

        let shared = loader.load().await;
        let s3_config = aws_sdk_s3::config::Builder::from(&shared)
            .force_path_style(config.endpoint.is_some())
            .build();

        Self {
            client: Client::from_conf(s3_config),
            bucket: config.bucket,
            region: config.region,
            endpoint: config.endpoint,
        }
    }

    /// Public URL of an object
    pub fn object_url(&self, key: &str) -> String {
        match &self.endpoint {
            Some(endpoint) => format!("{}/{}/{}", endpoint.trim_end_matches('/'), self.bucket, key),
            None => format!("https://{}.s3.{}.amazonaws.com/{}", self.bucket, self.region, key),
        }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put_object(&self, key: &str, body: Bytes, content_type: &str) -> Result<String, StorageError> {
        self.client
            .put_object()
            .bucket(self.bucket.as_str())
            .key(key)
            .body(ByteStream::from(body))
            .content_type(content_type)
            .acl(ObjectCannedAcl::PublicRead)
            .send()
            .await
            .map_err(|err| StorageError::Remote(format!("put object failed: {err}")))?;

        Ok(self.object_url(key))
    }

    async fn delete_object(&self, key: &str) -> Result<(), StorageError> {
        self.client
            .delete_object()
            .bucket(self.bucket.as_str())
            .key(key)
            .send()
            .await
            .map_err(|err| StorageError::Remote(format!("delete object failed: {err}")))?;

        Ok(())
    }

    async fn presign_get(&self, key: &str, expires_in: Duration) -> Result<String, StorageError> {
        let presigning = PresigningConfig::expires_in(expires_in)
            .map_err(|err| StorageError::Remote(format!("presign config failed: {err}")))?;

        let presigned = self
            .client
            .get_object()
            .bucket(self.bucket.as_str())
            .key(key)
            .presigned(presigning)
            .await
            .map_err(|err| StorageError::Remote(format!("presign failed: {err}")))?;

        Ok(presigned.uri().to_string())
    }
}
