//! HTTP handlers for the profile routes.
//!
//! Thin wrappers that extract the request and delegate to the lifecycle methods.

use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use profile_core::ApiError;
use profile_db::Profile;
use serde::Serialize;
use tracing::instrument;

use super::ProfileService;
use super::form::ProfileForm;

const READ_FAILED: &str = "Error fetching profile";
const CREATE_FAILED: &str = "Error creating profile";
const UPDATE_FAILED: &str = "Error updating profile";

/// Body of successful writes.
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    message: &'static str,
    profile: Profile,
}

/// Profile routes. `max_body_bytes` caps request bodies, pictures included.
pub fn router(service: Arc<ProfileService>, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/profile", post(create_profile))
        .route("/profile/{uid}", get(get_profile).put(update_profile))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .with_state(service)
}

#[instrument(skip(service))]
async fn get_profile(
    State(service): State<Arc<ProfileService>>,
    Path(uid): Path<String>,
) -> Result<Json<Profile>, ApiError> {
    let profile = service
        .read(&uid)
        .await
        .map_err(|e| e.into_api_error(READ_FAILED))?;
    Ok(Json(profile))
}

#[instrument(skip_all, fields(uid))]
async fn create_profile(
    State(service): State<Arc<ProfileService>>,
    form: ProfileForm,
) -> Result<(StatusCode, Json<ProfileResponse>), ApiError> {
    let uid = form.uid.unwrap_or_default();
    tracing::Span::current().record("uid", uid.as_str());

    let profile = service
        .create(&uid, form.fields, form.picture)
        .await
        .map_err(|e| e.into_api_error(CREATE_FAILED))?;

    Ok((
        StatusCode::CREATED,
        Json(ProfileResponse {
            message: "Profile created successfully",
            profile,
        }),
    ))
}

#[instrument(skip(service, form))]
async fn update_profile(
    State(service): State<Arc<ProfileService>>,
    Path(uid): Path<String>,
    form: ProfileForm,
) -> Result<Json<ProfileResponse>, ApiError> {
    let profile = service
        .update(&uid, form.fields, form.picture)
        .await
        .map_err(|e| e.into_api_error(UPDATE_FAILED))?;

    Ok(Json(ProfileResponse {
        message: "Profile updated successfully",
        profile,
    }))
}
