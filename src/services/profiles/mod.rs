//! Profile service.
//!
//! Organized by concern:
//! - `mod.rs`: core types and the `ProfileService` handle
//! - `form.rs`: request body extraction (multipart or JSON)
//! - `lifecycle.rs`: create, read and update flows
//! - `handlers.rs`: thin axum handlers and the router

mod form;
mod handlers;
mod lifecycle;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

use profile_core::AppError;
use profile_storage::MediaStore;
use serde::Deserialize;
use tracing::error;

use crate::core::ServiceContext;

pub use handlers::router;

/// Account id unknown to the auth provider on a read.
const USER_NOT_FOUND: &str = "User not found";
/// No profile document stored for a verified account.
const PROFILE_NOT_FOUND: &str = "Profile not found";
/// Account id unknown to the auth provider on a write.
const UNAUTHORIZED: &str = "Unauthorized access";

/// Free-form profile attributes supplied by the client.
///
/// An absent field is `None`. An empty string is kept as `Some("")` so that
/// create stores it verbatim and update can treat it as "keep existing".
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProfileFields {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub lifestyle: Option<String>,
}

/// Profile CRUD over the identity, document and media ports.
pub struct ProfileService {
    ctx: Arc<ServiceContext>,
}

impl ProfileService {
    #[must_use]
    pub fn new(ctx: Arc<ServiceContext>) -> Self {
        Self { ctx }
    }

    /// Shared context, used by the body extractor for the staging dir.
    #[inline]
    pub(crate) fn context(&self) -> &ServiceContext {
        &self.ctx
    }

    /// Returns media storage or error if not configured.
    #[inline]
    fn require_media(&self) -> Result<&dyn MediaStore, AppError> {
        self.ctx.media().ok_or_else(|| {
            error!("Media storage not configured");
            AppError::Internal("Storage not configured".to_string())
        })
    }
}
