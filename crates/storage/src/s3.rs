//! S3 storage client implementation.

use async_trait::async_trait;
use aws_credential_types::Credentials;
use aws_sdk_s3::{
    Client,
    config::{BehaviorVersion, Region, RequestChecksumCalculation, ResponseChecksumValidation},
    primitives::ByteStream,
};
use chrono::Utc;
use profile_core::{AppError, InternalExt};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, error, info};

use crate::{MediaStore, StagedUpload};

/// Region used when none is configured; MinIO ignores it.
const DEFAULT_REGION: &str = "us-east-1";

/// S3 storage configuration.
#[derive(Debug, Clone)]
pub struct S3Config {
    pub endpoint: String,
    pub bucket: String,
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: SecretString,
    /// Base URL clients use to fetch objects. Defaults to `<endpoint>/<bucket>`.
    pub public_url: Option<String>,
}

impl S3Config {
    /// Parse S3 URL: `http://host:port/bucket-name/`
    pub fn from_url(
        url: &str,
        access_key_id: String,
        secret_access_key: SecretString,
    ) -> Result<Self, AppError> {
        let url = url.trim_end_matches('/');
        let last_slash = url
            .rfind('/')
            .ok_or_else(|| AppError::InvalidArgument("Invalid S3 URL format".to_string()))?;

        let (endpoint, bucket) = url.split_at(last_slash);
        let bucket = &bucket[1..];

        if bucket.is_empty() || endpoint.ends_with('/') || !endpoint.contains("://") {
            return Err(AppError::InvalidArgument(
                "S3 URL must contain bucket name".to_string(),
            ));
        }

        Ok(Self {
            endpoint: endpoint.to_string(),
            bucket: bucket.to_string(),
            region: DEFAULT_REGION.to_string(),
            access_key_id,
            secret_access_key,
            public_url: None,
        })
    }

    #[must_use]
    pub fn with_region(mut self, region: Option<String>) -> Self {
        if let Some(region) = region {
            self.region = region;
        }
        self
    }

    #[must_use]
    pub fn with_public_url(mut self, public_url: Option<String>) -> Self {
        self.public_url = public_url;
        self
    }

    /// Base URL prepended to object keys in returned locators.
    #[must_use]
    pub fn public_base_url(&self) -> String {
        self.public_url.as_deref().map_or_else(
            || format!("{}/{}", self.endpoint, self.bucket),
            |url| url.trim_end_matches('/').to_string(),
        )
    }
}

/// S3 storage client for profile pictures.
#[derive(Clone)]
pub struct S3Storage {
    client: Client,
    bucket: String,
    public_base_url: String,
}

impl S3Storage {
    /// Create a new S3 storage client.
    #[must_use]
    pub fn new(config: &S3Config) -> Self {
        let credentials = Credentials::new(
            &config.access_key_id,
            config.secret_access_key.expose_secret(),
            None,
            None,
            "profile-service",
        );

        let s3_config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .endpoint_url(&config.endpoint)
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials)
            .force_path_style(true)
            // MinIO and GCS interop reject the default aws-chunked checksum trailers.
            .request_checksum_calculation(RequestChecksumCalculation::WhenRequired)
            .response_checksum_validation(ResponseChecksumValidation::WhenRequired)
            .build();

        info!(bucket = %config.bucket, endpoint = %config.endpoint, "S3 storage initialized");

        Self {
            client: Client::from_conf(s3_config),
            bucket: config.bucket.clone(),
            public_base_url: config.public_base_url(),
        }
    }

    fn locator(&self, key: &str) -> String {
        format!("{}/{key}", self.public_base_url)
    }
}

#[async_trait]
impl MediaStore for S3Storage {
    async fn store(&self, upload: StagedUpload) -> Result<String, AppError> {
        let key = upload.object_key(Utc::now().timestamp_millis());
        debug!(key = %key, size = upload.len(), "Uploading profile picture");

        let body = ByteStream::from_path(upload.path())
            .await
            .internal("Failed to read staged upload")?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .content_type(upload.content_type())
            .body(body)
            .send()
            .await
            .map_err(|e| {
                error!(key = %key, error = ?e, "S3 upload failed");
                AppError::Internal(format!("Failed to upload profile picture: {e}"))
            })?;

        drop(upload);

        info!(key = %key, "Profile picture uploaded");
        Ok(self.locator(&key))
    }

    async fn remove(&self, key: &str) -> Result<(), AppError> {
        debug!(key = %key, "Deleting profile picture");

        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to delete {key}: {e}")))?;

        info!(key = %key, "Profile picture deleted");
        Ok(())
    }

    async fn health_check(&self) -> bool {
        self.client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .is_ok()
    }
}
