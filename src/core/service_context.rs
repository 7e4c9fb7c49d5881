//! Shared service context.
//!
//! Holds the external service clients. They are built once at startup and
//! injected here, so tests can swap any of them for in-memory fakes.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use profile_db::ProfileStore;
use profile_identity::IdentityVerifier;
use profile_storage::MediaStore;

/// Shared infrastructure context for all services.
///
/// Services hold `Arc<ServiceContext>` to share this efficiently.
#[derive(Clone)]
pub struct ServiceContext {
    identity: Arc<dyn IdentityVerifier>,
    profiles: Arc<dyn ProfileStore>,
    media: Option<Arc<dyn MediaStore>>,
    upload_dir: PathBuf,
}

impl ServiceContext {
    #[must_use]
    pub fn new(
        identity: Arc<dyn IdentityVerifier>,
        profiles: Arc<dyn ProfileStore>,
        media: Option<Arc<dyn MediaStore>>,
        upload_dir: PathBuf,
    ) -> Self {
        Self {
            identity,
            profiles,
            media,
            upload_dir,
        }
    }

    /// Auth provider account lookup.
    #[inline]
    #[must_use]
    pub fn identity(&self) -> &dyn IdentityVerifier {
        self.identity.as_ref()
    }

    /// Profile document store.
    #[inline]
    #[must_use]
    pub fn profiles(&self) -> &dyn ProfileStore {
        self.profiles.as_ref()
    }

    /// Object storage for profile pictures, if configured.
    #[inline]
    #[must_use]
    pub fn media(&self) -> Option<&dyn MediaStore> {
        self.media.as_deref()
    }

    /// Directory where incoming files are staged.
    #[inline]
    #[must_use]
    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }
}
