use axum::extract::{Multipart, Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use garde::Validate;

use crate::app_state::AppState;
use crate::models::session::{RerunResponse, SelectImageRequest, SessionResponse};
use crate::routes::error::ApiError;
use crate::services::image_payload;

/// POST /api/v1/session — select a new source image given as a (data URL) base64 string.
pub async fn select_image(
    State(state): State<AppState>,
    Json(request): Json<SelectImageRequest>,
) -> Result<(StatusCode, Json<SessionResponse>), ApiError> {
    request
        .validate()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let image = image_payload::from_encoded(&request.image)?;
    let snapshot = state.studio.start(image).await?;

    Ok((StatusCode::ACCEPTED, Json(snapshot.into())))
}

/// POST /api/v1/session/upload — select a new source image from a multipart upload.
pub async fn upload_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<SessionResponse>), ApiError> {
    let mut image_data: Option<Vec<u8>> = None;

    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some("image") {
            image_data = Some(field.bytes().await?.to_vec());
        }
    }

    let image_data =
        image_data.ok_or_else(|| ApiError::BadRequest("missing `image` field".to_string()))?;
    let image = image_payload::from_bytes(&image_data)?;
    let snapshot = state.studio.start(image).await?;

    Ok((StatusCode::ACCEPTED, Json(snapshot.into())))
}

/// GET /api/v1/session — current run snapshot.
pub async fn get_session(State(state): State<AppState>) -> Result<Json<SessionResponse>, ApiError> {
    let snapshot = state.studio.snapshot().await?;
    Ok(Json(snapshot.into()))
}

/// POST /api/v1/session/rerun — generate pending and failed items again.
pub async fn rerun(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<RerunResponse>), ApiError> {
    let (snapshot, scheduled) = state.studio.rerun().await?;

    let message = if scheduled == 0 {
        "Nothing to re-run".to_string()
    } else {
        format!("Re-running {} styles", scheduled)
    };

    Ok((
        StatusCode::ACCEPTED,
        Json(RerunResponse {
            run_id: snapshot.run_id,
            scheduled,
            message,
        }),
    ))
}

/// DELETE /api/v1/session — abandon the current image and go back to upload.
pub async fn reset(State(state): State<AppState>) -> StatusCode {
    if state.studio.reset().await {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

/// GET /api/v1/session/items/{id}/image — download one generated image.
pub async fn download_image(
    State(state): State<AppState>,
    Path(id): Path<u32>,
) -> Result<Response, ApiError> {
    let image = state.studio.result_image(id).await?;
    let bytes = image
        .decode()
        .map_err(|e| ApiError::Internal(format!("generated image is not valid base64: {}", e)))?;

    let disposition = format!("attachment; filename=\"{}\"", image.file_name(id));

    Ok((
        [
            (header::CONTENT_TYPE, image.mime_type.clone()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}
