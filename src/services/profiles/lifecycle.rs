//! Profile lifecycle: create, read, update.

use profile_core::{AppError, OptionExt, OptionStrExt};
use profile_db::Profile;
use profile_storage::{StagedUpload, key_from_locator};
use tracing::{debug, info, instrument, warn};

use super::{PROFILE_NOT_FOUND, ProfileFields, ProfileService, UNAUTHORIZED, USER_NOT_FOUND};

/// Counter for stale pictures that could not be deleted.
const REMOVE_FAILURES_METRIC: &str = "profile_media_remove_failures_total";

impl ProfileService {
    /// Stores a new profile for `uid`, replacing any existing one.
    #[instrument(skip(self, fields, picture), fields(has_picture = picture.is_some()))]
    pub async fn create(
        &self,
        uid: &str,
        fields: ProfileFields,
        picture: Option<StagedUpload>,
    ) -> Result<Profile, AppError> {
        self.authorize(uid).await?;

        let profile_picture = match picture {
            Some(upload) => Some(self.require_media()?.store(upload).await?),
            None => None,
        };

        let profile = Profile {
            uid: uid.to_string(),
            name: fields.name,
            gender: fields.gender,
            lifestyle: fields.lifestyle,
            profile_picture,
        };
        self.ctx.profiles().put(uid, &profile).await?;

        info!("Profile created");
        Ok(profile)
    }

    /// Fetches the profile of an existing account.
    #[instrument(skip(self))]
    pub async fn read(&self, uid: &str) -> Result<Profile, AppError> {
        if self.ctx.identity().verify(uid).await.is_none() {
            debug!("Read for unknown account");
            return Err(AppError::NotFound(USER_NOT_FOUND.to_string()));
        }

        self.ctx
            .profiles()
            .get(uid)
            .await?
            .ok_or_not_found(PROFILE_NOT_FOUND)
    }

    /// Merges `fields` and an optional new picture into the stored profile.
    ///
    /// Empty or absent fields keep their stored value. A new picture replaces
    /// the old object; deleting the old one is best-effort.
    #[instrument(skip(self, fields, picture), fields(has_picture = picture.is_some()))]
    pub async fn update(
        &self,
        uid: &str,
        fields: ProfileFields,
        picture: Option<StagedUpload>,
    ) -> Result<Profile, AppError> {
        self.authorize(uid).await?;

        let existing = self
            .ctx
            .profiles()
            .get(uid)
            .await?
            .ok_or_not_found(PROFILE_NOT_FOUND)?;

        let profile_picture = match picture {
            Some(upload) => Some(
                self.replace_picture(existing.profile_picture.as_deref(), upload)
                    .await?,
            ),
            None => existing.profile_picture,
        };

        let merged = Profile {
            uid: existing.uid,
            name: fields.name.non_empty().or(existing.name),
            gender: fields.gender.non_empty().or(existing.gender),
            lifestyle: fields.lifestyle.non_empty().or(existing.lifestyle),
            profile_picture,
        };
        self.ctx.profiles().put(uid, &merged).await?;

        info!("Profile updated");
        Ok(merged)
    }

    /// Rejects writes for ids the auth provider does not know.
    async fn authorize(&self, uid: &str) -> Result<(), AppError> {
        if self.ctx.identity().verify(uid).await.is_none() {
            warn!("Write rejected for unknown account");
            return Err(AppError::PermissionDenied(UNAUTHORIZED.to_string()));
        }
        Ok(())
    }

    /// Uploads `upload` while deleting the object behind `old_locator`.
    ///
    /// Only the upload outcome is returned.
    async fn replace_picture(
        &self,
        old_locator: Option<&str>,
        upload: StagedUpload,
    ) -> Result<String, AppError> {
        let media = self.require_media()?;
        let stale_key = old_locator.and_then(key_from_locator);

        let removal = async {
            match &stale_key {
                Some(key) => Some(media.remove(key).await),
                None => None,
            }
        };
        let (removed, stored) = tokio::join!(removal, media.store(upload));

        match removed {
            Some(Ok(())) => debug!(key = ?stale_key, "Previous picture removed"),
            Some(Err(e)) => {
                warn!(key = ?stale_key, error = %e, "Failed to remove previous picture");
                metrics::counter!(REMOVE_FAILURES_METRIC).increment(1);
            }
            None => {}
        }

        stored
    }
}
