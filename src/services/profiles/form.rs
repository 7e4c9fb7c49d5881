//! Request body extraction for profile writes.
//!
//! Accepts `multipart/form-data` with an optional `profilePicture` file part,
//! or `application/json` carrying the same text fields.

use std::path::Path;
use std::sync::Arc;

use axum::Json;
use axum::extract::multipart::{Field, MultipartError};
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Multipart, Request};
use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use profile_core::ApiError;
use profile_storage::{StagedUpload, UploadStager};
use serde::Deserialize;
use tracing::{debug, error};

use super::{ProfileFields, ProfileService};

/// Multipart part carrying the picture file.
const PICTURE_FIELD: &str = "profilePicture";

/// Content type assumed for file parts that do not declare one.
const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Parsed profile write request.
#[derive(Debug, Default)]
pub struct ProfileForm {
    /// Account id from the body; only meaningful on create.
    pub uid: Option<String>,
    pub fields: ProfileFields,
    /// Staged picture, if a non-empty file part was sent.
    pub picture: Option<StagedUpload>,
}

#[derive(Deserialize)]
struct JsonForm {
    #[serde(default)]
    uid: Option<String>,
    #[serde(flatten)]
    fields: ProfileFields,
}

impl FromRequest<Arc<ProfileService>> for ProfileForm {
    type Rejection = ApiError;

    async fn from_request(
        req: Request,
        state: &Arc<ProfileService>,
    ) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_ascii_lowercase);

        match content_type.as_deref() {
            Some(ct) if ct.starts_with("multipart/form-data") => {
                let multipart = Multipart::from_request(req, state)
                    .await
                    .map_err(|e| ApiError::new(e.status(), e.body_text()))?;
                Self::from_multipart(multipart, state.context().upload_dir()).await
            }
            Some(ct) if ct.starts_with("application/json") => {
                let Json(body) = Json::<JsonForm>::from_request(req, state)
                    .await
                    .map_err(json_error)?;
                Ok(Self {
                    uid: body.uid,
                    fields: body.fields,
                    picture: None,
                })
            }
            // Bodyless requests carry no fields at all.
            None => Ok(Self::default()),
            Some(other) => {
                debug!(content_type = other, "Unsupported request body");
                Err(ApiError::bad_request(
                    "Expected multipart/form-data or application/json body",
                ))
            }
        }
    }
}

impl ProfileForm {
    async fn from_multipart(mut multipart: Multipart, upload_dir: &Path) -> Result<Self, ApiError> {
        let mut form = Self::default();

        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let Some(name) = field.name().map(str::to_owned) else {
                continue;
            };

            match name.as_str() {
                PICTURE_FIELD => form.picture = stage_picture(field, upload_dir).await?,
                "uid" => form.uid = Some(field_text(field).await?),
                "name" => form.fields.name = Some(field_text(field).await?),
                "gender" => form.fields.gender = Some(field_text(field).await?),
                "lifestyle" => form.fields.lifestyle = Some(field_text(field).await?),
                _ => debug!(field = %name, "Ignoring unknown form field"),
            }
        }

        Ok(form)
    }
}

async fn field_text(field: Field<'_>) -> Result<String, ApiError> {
    field.text().await.map_err(multipart_error)
}

/// Stream a file part to disk. Parts without a filename or bytes count as absent.
async fn stage_picture(
    mut field: Field<'_>,
    upload_dir: &Path,
) -> Result<Option<StagedUpload>, ApiError> {
    let Some(file_name) = field
        .file_name()
        .filter(|name| !name.is_empty())
        .map(str::to_owned)
    else {
        return Ok(None);
    };
    let content_type = field.content_type().unwrap_or(DEFAULT_CONTENT_TYPE).to_owned();

    let mut stager =
        UploadStager::new_in(upload_dir, &file_name, content_type).map_err(staging_error)?;
    while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
        stager.write_chunk(&chunk).await.map_err(staging_error)?;
    }
    let upload = stager.finish().await.map_err(staging_error)?;

    debug!(file_name = %upload.original_name(), bytes = upload.len(), "Picture staged");
    Ok((!upload.is_empty()).then_some(upload))
}

/// Keeps the multipart status, so oversized bodies surface as 413.
fn multipart_error(e: MultipartError) -> ApiError {
    ApiError::new(e.status(), e.body_text())
}

/// Malformed or mistyped JSON is a 400; only the size limit keeps its own status.
fn json_error(e: JsonRejection) -> ApiError {
    let status = match e.status() {
        StatusCode::PAYLOAD_TOO_LARGE => StatusCode::PAYLOAD_TOO_LARGE,
        _ => StatusCode::BAD_REQUEST,
    };
    ApiError::new(status, e.body_text())
}

fn staging_error(e: std::io::Error) -> ApiError {
    error!(error = %e, "Failed to stage upload");
    ApiError::internal("Failed to stage upload")
}
