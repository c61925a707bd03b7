use axum::{
    extract::{Path, State},
    Extension, Json,
};
use std::sync::Arc;

use crate::{
    error::AppResult,
    middleware::RequestId,
    models::RatingSummaryResponse,
    routes::require_id,
    services::aggregation,
    state::AppState,
};

/// Handler for a title's normalized rating
pub async fn summary(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Path(subject_id): Path<String>,
) -> AppResult<Json<RatingSummaryResponse>> {
    let subject_id = require_id("subject_id", &subject_id)?;

    let rating = aggregation::normalized_rating(state.ratings.clone(), subject_id).await?;

    tracing::info!(
        request_id = %request_id,
        subject_id = %subject_id,
        score = ?rating.score(),
        "Rating summary served"
    );

    Ok(Json(RatingSummaryResponse::new(
        subject_id.to_string(),
        rating,
    )))
}
