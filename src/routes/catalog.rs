use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::{CatalogEntry, MediaKind},
    state::AppState,
};

/// Handler listing one catalog (`movie` or `show`)
pub async fn list(
    State(state): State<Arc<AppState>>,
    Path(kind): Path<String>,
) -> AppResult<Json<Vec<CatalogEntry>>> {
    let kind: MediaKind = kind.parse().map_err(AppError::InvalidInput)?;
    let entries = state.catalog.catalog(kind).await?;
    Ok(Json(entries))
}
