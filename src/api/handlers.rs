use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    Extension, Json,
};
use serde_json::{json, Value};

use crate::error::{AppError, AppResult};
use crate::middleware::request_id::RequestId;
use crate::models::{CreateRecommendation, Recommendation};

use super::AppState;

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Create a new recommendation
pub async fn create_recommendation(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    payload: Result<Json<CreateRecommendation>, JsonRejection>,
) -> AppResult<StatusCode> {
    let Json(request) = payload?;
    request.validate().map_err(AppError::InvalidInput)?;

    tracing::info!(request_id = %request_id, name = %request.name, "Creating recommendation");

    state.recommendations.insert(request).await?;
    Ok(StatusCode::CREATED)
}

/// List all recommendations
pub async fn get_recommendations(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<Recommendation>>> {
    let recommendations = state.recommendations.get().await?;
    Ok(Json(recommendations))
}

/// Get a single recommendation by id
pub async fn get_recommendation(
    State(state): State<AppState>,
    path: Result<Path<i32>, PathRejection>,
) -> AppResult<Json<Recommendation>> {
    let Path(id) = path?;
    let recommendation = state.recommendations.get_by_id(id).await?;
    Ok(Json(recommendation))
}

/// Pick a weighted-random recommendation
pub async fn get_random_recommendation(
    State(state): State<AppState>,
) -> AppResult<Json<Recommendation>> {
    let recommendation = state.recommendations.get_random().await?;
    Ok(Json(recommendation))
}

/// Get the highest-scored recommendations
pub async fn get_top_recommendations(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> AppResult<Json<Vec<Recommendation>>> {
    let Path(amount) = path?;
    if amount < 0 {
        return Err(AppError::InvalidInput(format!(
            "amount must not be negative, got {}",
            amount
        )));
    }

    let recommendations = state.recommendations.get_top(amount).await?;
    Ok(Json(recommendations))
}

pub async fn upvote(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    path: Result<Path<i32>, PathRejection>,
) -> AppResult<StatusCode> {
    let Path(id) = path?;
    tracing::info!(request_id = %request_id, id, "Upvote");
    state.recommendations.upvote(id).await?;
    Ok(StatusCode::OK)
}

pub async fn downvote(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    path: Result<Path<i32>, PathRejection>,
) -> AppResult<StatusCode> {
    let Path(id) = path?;
    tracing::info!(request_id = %request_id, id, "Downvote");
    state.recommendations.downvote(id).await?;
    Ok(StatusCode::OK)
}
