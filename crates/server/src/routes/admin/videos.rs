//! Admin YouTube video management.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::instrument;

use bandsite_core::VideoId;

use super::{MAX_TITLE_LENGTH, embed_error, reorder_error};
use crate::db::VideoRepository;
use crate::error::AppError;
use crate::middleware::RequireAdmin;
use crate::models::{ReorderInput, Video, VideoInput};
use crate::services::embeds::parse_youtube_url;
use crate::services::validation::optional_text;
use crate::state::AppState;

fn validate(input: VideoInput) -> Result<(String, String, Option<String>), AppError> {
    let url = input.youtube_url.trim().to_string();
    let video_id = parse_youtube_url(&url).map_err(|e| embed_error("youtube_url", &e))?;
    let title = optional_text("title", input.title, MAX_TITLE_LENGTH)?;
    Ok((url, video_id, title))
}

pub async fn list(
    State(state): State<AppState>,
    RequireAdmin { tenant, .. }: RequireAdmin,
) -> Result<Json<Vec<Video>>, AppError> {
    Ok(Json(VideoRepository::new(state.pool()).list(tenant.id()).await?))
}

#[instrument(skip_all, fields(tenant_id = %auth.tenant.id()))]
pub async fn create(
    State(state): State<AppState>,
    auth: RequireAdmin,
    Json(input): Json<VideoInput>,
) -> Result<(StatusCode, Json<Video>), AppError> {
    let (url, video_id, title) = validate(input)?;
    let video = VideoRepository::new(state.pool())
        .create(auth.tenant.id(), &url, &video_id, title.as_deref())
        .await?;

    tracing::info!(video_id = %video.video_id, "Video added");
    Ok((StatusCode::CREATED, Json(video)))
}

#[instrument(skip_all, fields(tenant_id = %auth.tenant.id(), id))]
pub async fn update(
    State(state): State<AppState>,
    auth: RequireAdmin,
    Path(id): Path<i32>,
    Json(input): Json<VideoInput>,
) -> Result<Json<Video>, AppError> {
    let (url, video_id, title) = validate(input)?;
    let video = VideoRepository::new(state.pool())
        .update(
            auth.tenant.id(),
            VideoId::new(id),
            &url,
            &video_id,
            title.as_deref(),
        )
        .await?;
    Ok(Json(video))
}

#[instrument(skip_all, fields(tenant_id = %auth.tenant.id(), id))]
pub async fn delete(
    State(state): State<AppState>,
    auth: RequireAdmin,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    VideoRepository::new(state.pool())
        .delete(auth.tenant.id(), VideoId::new(id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Set display order. `ids` must list every video exactly once.
#[instrument(skip_all, fields(tenant_id = %auth.tenant.id()))]
pub async fn reorder(
    State(state): State<AppState>,
    auth: RequireAdmin,
    Json(input): Json<ReorderInput>,
) -> Result<Json<Vec<Video>>, AppError> {
    let repo = VideoRepository::new(state.pool());
    repo.reorder(auth.tenant.id(), &input.ids)
        .await
        .map_err(reorder_error)?;
    Ok(Json(repo.list(auth.tenant.id()).await?))
}
