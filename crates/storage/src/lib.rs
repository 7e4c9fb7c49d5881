//! Object storage for profile pictures.
//!
//! - [`MediaStore`]: the port used by the profile service
//! - [`S3Storage`]: S3-compatible adapter (MinIO, GCS interop, AWS)
//! - [`StagedUpload`]: an uploaded file parked on local disk until it is pushed

mod s3;
mod staged;

use async_trait::async_trait;
use profile_core::AppError;

pub use s3::{S3Config, S3Storage};
pub use staged::{StagedUpload, UploadStager};

/// Key prefix for every stored profile picture.
pub const MEDIA_PREFIX: &str = "profile-pictures";

/// Binary object store holding profile pictures.
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Push `upload` to storage and return its public locator.
    ///
    /// The staged local file is released when this returns, on every path.
    async fn store(&self, upload: StagedUpload) -> Result<String, AppError>;

    /// Delete the object stored under `key`.
    ///
    /// Callers treat this as best-effort; the result only reports the outcome.
    async fn remove(&self, key: &str) -> Result<(), AppError>;

    /// Check whether the backing store is reachable.
    async fn health_check(&self) -> bool {
        true
    }
}

/// Build the object key for an upload: `profile-pictures/<millis>-<name>`.
///
/// The timestamp makes keys practically unique, not collision-proof.
#[must_use]
pub fn media_key(timestamp_millis: i64, original_name: &str) -> String {
    format!("{MEDIA_PREFIX}/{timestamp_millis}-{original_name}")
}

/// Recover the object key from a public locator.
///
/// Takes the suffix after the last `/`. Returns `None` when there is nothing
/// after it.
#[must_use]
pub fn key_from_locator(locator: &str) -> Option<String> {
    let file_name = locator.rsplit('/').next().unwrap_or_default();
    (!file_name.is_empty()).then(|| format!("{MEDIA_PREFIX}/{file_name}"))
}
