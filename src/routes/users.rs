use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    middleware::RequestId,
    models::{RatingRecord, RecordProgressRequest, SetBookmarkRequest, SetRatingRequest},
    routes::require_id,
    state::AppState,
};

/// Validated (user_id, subject_id) pair from the path
fn record_key(path: &(String, String)) -> AppResult<(&str, &str)> {
    Ok((
        require_id("user_id", &path.0)?,
        require_id("subject_id", &path.1)?,
    ))
}

/// Handler for a user's full watch history
pub async fn history(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> AppResult<Json<Vec<RatingRecord>>> {
    let user_id = require_id("user_id", &user_id)?;
    Ok(Json(state.ratings.watch_history_for(user_id).await?))
}

/// Handler for a user's bookmarked titles
pub async fn bookmarks(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> AppResult<Json<Vec<RatingRecord>>> {
    let user_id = require_id("user_id", &user_id)?;
    Ok(Json(state.ratings.bookmarks_for(user_id).await?))
}

pub async fn set_rating(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Path(path): Path<(String, String)>,
    Json(request): Json<SetRatingRequest>,
) -> AppResult<Json<RatingRecord>> {
    let (user_id, subject_id) = record_key(&path)?;

    let record = state
        .ratings
        .record_rating(user_id, subject_id, request.rating)
        .await?;

    tracing::info!(
        request_id = %request_id,
        user_id = %user_id,
        subject_id = %subject_id,
        rating = %request.rating,
        "Rating recorded"
    );

    Ok(Json(record))
}

pub async fn record_progress(
    State(state): State<Arc<AppState>>,
    Path(path): Path<(String, String)>,
    Json(request): Json<RecordProgressRequest>,
) -> AppResult<Json<RatingRecord>> {
    let (user_id, subject_id) = record_key(&path)?;

    let record = state
        .ratings
        .record_progress(user_id, subject_id, request.watch_duration_ticks)
        .await?;

    tracing::debug!(
        user_id = %user_id,
        subject_id = %subject_id,
        ticks = request.watch_duration_ticks,
        "Watch progress recorded"
    );

    Ok(Json(record))
}

pub async fn set_bookmark(
    State(state): State<Arc<AppState>>,
    Path(path): Path<(String, String)>,
    Json(request): Json<SetBookmarkRequest>,
) -> AppResult<Json<RatingRecord>> {
    let (user_id, subject_id) = record_key(&path)?;

    let record = state
        .ratings
        .set_bookmark(user_id, subject_id, request.bookmarked)
        .await?;

    Ok(Json(record))
}

pub async fn delete_record(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Path(path): Path<(String, String)>,
) -> AppResult<StatusCode> {
    let (user_id, subject_id) = record_key(&path)?;

    if !state.ratings.delete_record(user_id, subject_id).await? {
        return Err(AppError::NotFound(format!(
            "no record for user {} and title {}",
            user_id, subject_id
        )));
    }

    tracing::info!(
        request_id = %request_id,
        user_id = %user_id,
        subject_id = %subject_id,
        "Rating record deleted"
    );

    Ok(StatusCode::NO_CONTENT)
}
