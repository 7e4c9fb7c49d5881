//! Database layer with SQLx for profile documents.
//!
//! Provides:
//! - Connection pool management via [`create_pool`]
//! - The [`ProfileStore`] port and its PostgreSQL adapter [`ProfileRepository`]
//! - The stored [`Profile`] document
//!
//! # Example
//!
//! ```ignore
//! use profile_db::{create_pool, Database, DbConfig, ProfileStore};
//!
//! let pool = create_pool(&DbConfig::from_url("postgres://localhost/profiles")).await?;
//! let db = Database::new(pool);
//! db.migrate().await?;
//!
//! let profile = db.profiles.get("uid-123").await?;
//! ```

#![expect(clippy::doc_markdown, reason = "SQLx capitalization is intentional")]

mod models;
mod repository;

use profile_core::AppError;

/// Database error wrapper.
///
/// Repository methods apply `.map_err(DbError)` so that `?` converts the
/// failure into `AppError::Unavailable`.
#[derive(Debug)]
struct DbError(sqlx::Error);

impl From<DbError> for AppError {
    #[inline]
    fn from(e: DbError) -> Self {
        Self::Unavailable(e.0.to_string())
    }
}

pub use models::Profile;
pub use repository::{Database, DbConfig, ProfileRepository, ProfileStore, create_pool};
