//! Uploaded files parked on local disk before they are pushed to storage.
//!
//! The temporary file belongs to the [`StagedUpload`] value and is deleted
//! when it is dropped, whatever path the request takes.

use std::io;
use std::path::Path;

use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;

use crate::media_key;

/// Temporary file prefix, to make leftovers easy to spot.
const STAGING_PREFIX: &str = "profile-upload-";

/// A client upload staged in a temporary file.
#[derive(Debug)]
pub struct StagedUpload {
    file: NamedTempFile,
    original_name: String,
    content_type: String,
    len: u64,
}

impl StagedUpload {
    /// Local path of the staged bytes.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Client-supplied file name with path separators replaced.
    #[must_use]
    pub fn original_name(&self) -> &str {
        &self.original_name
    }

    #[must_use]
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Number of staged bytes.
    #[must_use]
    pub const fn len(&self) -> u64 {
        self.len
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Object key for this upload at the given time.
    #[must_use]
    pub fn object_key(&self, timestamp_millis: i64) -> String {
        media_key(timestamp_millis, &self.original_name)
    }
}

/// Streams an incoming file part into a temporary file.
#[derive(Debug)]
pub struct UploadStager {
    file: NamedTempFile,
    writer: tokio::fs::File,
    original_name: String,
    content_type: String,
    len: u64,
}

impl UploadStager {
    /// Create a staging file inside `dir`.
    pub fn new_in(
        dir: &Path,
        original_name: &str,
        content_type: impl Into<String>,
    ) -> io::Result<Self> {
        let file = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .tempfile_in(dir)?;
        let writer = tokio::fs::File::from_std(file.as_file().try_clone()?);

        Ok(Self {
            file,
            writer,
            original_name: sanitize_file_name(original_name),
            content_type: content_type.into(),
            len: 0,
        })
    }

    /// Append a chunk of the file part.
    pub async fn write_chunk(&mut self, chunk: &[u8]) -> io::Result<()> {
        self.writer.write_all(chunk).await?;
        self.len += chunk.len() as u64;
        Ok(())
    }

    /// Flush the staged bytes and hand over ownership of the file.
    pub async fn finish(mut self) -> io::Result<StagedUpload> {
        self.writer.flush().await?;
        self.writer.sync_all().await?;

        Ok(StagedUpload {
            file: self.file,
            original_name: self.original_name,
            content_type: self.content_type,
            len: self.len,
        })
    }
}

/// Keep object keys one level deep so the key can be recovered from the locator.
fn sanitize_file_name(name: &str) -> String {
    name.replace(['/', '\\'], "_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stages_chunks_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let mut stager = UploadStager::new_in(dir.path(), "me.png", "image/png").unwrap();
        stager.write_chunk(b"hello ").await.unwrap();
        stager.write_chunk(b"world").await.unwrap();

        let upload = stager.finish().await.unwrap();
        assert_eq!(upload.len(), 11);
        assert_eq!(upload.content_type(), "image/png");
        assert_eq!(std::fs::read(upload.path()).unwrap(), b"hello world");
    }

    #[tokio::test]
    async fn dropping_upload_removes_staged_file() {
        let dir = tempfile::tempdir().unwrap();
        let stager = UploadStager::new_in(dir.path(), "me.png", "image/png").unwrap();
        let upload = stager.finish().await.unwrap();
        let path = upload.path().to_path_buf();
        assert!(path.exists());

        drop(upload);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn dropping_unfinished_stager_removes_staged_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut stager = UploadStager::new_in(dir.path(), "me.png", "image/png").unwrap();
        stager.write_chunk(b"partial").await.unwrap();

        drop(stager);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn object_key_strips_path_separators() {
        let dir = tempfile::tempdir().unwrap();
        let stager = UploadStager::new_in(dir.path(), "../etc\\me.png", "image/png").unwrap();
        let upload = stager.finish().await.unwrap();

        assert_eq!(upload.original_name(), ".._etc_me.png");
        assert_eq!(upload.object_key(42), "profile-pictures/42-.._etc_me.png");
    }
}
