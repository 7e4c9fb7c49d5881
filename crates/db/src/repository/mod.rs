//! Database repository layer with connection pooling.
//!
//! # Error Handling
//!
//! All repository methods return `Result<T, AppError>` where errors are:
//! - `AppError::Unavailable` - Database connection, query or migration
//!   failures, including stored documents that fail to decode

mod config;
mod profile;

use async_trait::async_trait;
use profile_core::AppError;
use sqlx::postgres::PgPool;
use tracing::info;

pub use config::{DbConfig, create_pool};
pub use profile::ProfileRepository;

use crate::Profile;

/// Keyed document store for profiles.
///
/// `put` always replaces the whole document; merging is the caller's job.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Fetch the profile stored under `uid`, if any.
    async fn get(&self, uid: &str) -> Result<Option<Profile>, AppError>;

    /// Store `profile` under `uid`, overwriting any existing document.
    async fn put(&self, uid: &str, profile: &Profile) -> Result<(), AppError>;

    /// Check whether the backing store is reachable.
    async fn health_check(&self) -> bool {
        true
    }
}

/// Combined database context.
#[derive(Debug, Clone)]
pub struct Database {
    pub profiles: ProfileRepository,
    pool: PgPool,
}

impl Database {
    /// Creates a new database context with all repositories.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self {
            profiles: ProfileRepository::new(pool.clone()),
            pool,
        }
    }

    /// Apply embedded schema migrations.
    pub async fn migrate(&self) -> Result<(), AppError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::Unavailable(format!("Database migration failed: {e}")))?;
        info!("Database migrations applied");
        Ok(())
    }
}
