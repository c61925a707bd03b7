use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use std::sync::Arc;

use crate::{
    error::AppResult,
    middleware::RequestId,
    models::{GenreWeight, RecommendationQuery, Recommendations},
    routes::require_id,
    services::{preferences, recommendations},
    state::AppState,
};

/// Handler for a user's recommendations
///
/// Always answers 200; upstream failures show up as empty lists.
pub async fn recommend(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Path(user_id): Path<String>,
    Query(query): Query<RecommendationQuery>,
) -> AppResult<Json<Recommendations>> {
    let user_id = require_id("user_id", &user_id)?;

    tracing::info!(
        request_id = %request_id,
        user_id = %user_id,
        limit = ?query.limit,
        "Processing recommendation request"
    );

    let mut recs = recommendations::recommendations_for(
        state.ratings.clone(),
        state.catalog.clone(),
        user_id,
        state.genre_limit,
    )
    .await;

    if let Some(limit) = query.limit {
        recs.truncate(limit);
    }

    Ok(Json(recs))
}

/// Handler for a user's ranked genre weights
pub async fn genres(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> AppResult<Json<Vec<GenreWeight>>> {
    let user_id = require_id("user_id", &user_id)?;
    let ranking =
        preferences::genre_ranking(state.ratings.clone(), state.catalog.clone(), user_id).await?;
    Ok(Json(ranking))
}
