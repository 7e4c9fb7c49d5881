//! Profile repository for the `profiles` document table.

use async_trait::async_trait;
use sqlx::postgres::PgPool;
use sqlx::types::Json;
use tracing::debug;

use super::ProfileStore;
use crate::{AppError, DbError, Profile};

/// PostgreSQL-backed [`ProfileStore`]: one JSONB document per `uid`.
#[derive(Debug, Clone)]
pub struct ProfileRepository {
    pool: PgPool,
}

impl ProfileRepository {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileStore for ProfileRepository {
    async fn get(&self, uid: &str) -> Result<Option<Profile>, AppError> {
        let row: Option<(Json<Profile>,)> = sqlx::query_as(
            r"
            SELECT document
              FROM profiles
             WHERE uid = $1
            ",
        )
        .bind(uid)
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError)?;

        Ok(row.map(|(Json(profile),)| profile))
    }

    async fn put(&self, uid: &str, profile: &Profile) -> Result<(), AppError> {
        sqlx::query(
            r"
            INSERT INTO profiles (uid, document)
            VALUES ($1, $2)
            ON CONFLICT (uid) DO UPDATE
               SET document = EXCLUDED.document,
                   updated_at = now()
            ",
        )
        .bind(uid)
        .bind(Json(profile))
        .execute(&self.pool)
        .await
        .map_err(DbError)?;

        debug!(uid = %uid, "Profile document written");
        Ok(())
    }

    async fn health_check(&self) -> bool {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .is_ok()
    }
}
