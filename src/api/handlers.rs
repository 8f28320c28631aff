use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{AppError, AppResult};
use crate::middleware::request_id::RequestId;
use crate::models::{CatalogStats, Movie, RecommendationResponse};
use crate::services::recommendations;

use super::AppState;

// Request/Response types

#[derive(Debug, Deserialize)]
pub struct RecommendationQuery {
    pub title: String,
    pub k: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct MoviesResponse {
    pub movies: Vec<Movie>,
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// List every catalog movie in catalog order
pub async fn list_movies(State(state): State<AppState>) -> Json<MoviesResponse> {
    Json(MoviesResponse {
        movies: state.store.movies().to_vec(),
    })
}

/// Catalog and matrix statistics
pub async fn catalog_stats(State(state): State<AppState>) -> Json<CatalogStats> {
    Json(state.store.stats())
}

/// Recommend movies similar to the requested title
pub async fn recommend(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    query: Result<Query<RecommendationQuery>, QueryRejection>,
) -> AppResult<Json<RecommendationResponse>> {
    let Query(query) = query.map_err(|rejection| AppError::InvalidInput(rejection.body_text()))?;
    let k = query.k.unwrap_or(state.settings.default_count);
    if k == 0 || k > state.settings.max_count {
        return Err(AppError::InvalidInput(format!(
            "k must be between 1 and {}",
            state.settings.max_count
        )));
    }

    tracing::info!(
        request_id = %request_id,
        title = %query.title,
        k,
        "Processing recommendation request"
    );

    let recommendations = recommendations::recommend(
        &state.store,
        &state.posters,
        &query.title,
        k,
        state.settings.deadline,
    )
    .await
    .map_err(|e| {
        tracing::info!(request_id = %request_id, error = %e, "Recommendation request failed");
        e
    })?;

    tracing::info!(
        request_id = %request_id,
        count = recommendations.len(),
        "Recommendations completed"
    );

    Ok(Json(RecommendationResponse {
        query: query.title,
        recommendations,
    }))
}
