use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::handlers;
use super::AppState;
use crate::middleware::request_id::{make_span_with_request_id, request_id_middleware};

/// Creates the main API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route(
            "/recommendations",
            get(handlers::get_recommendations).post(handlers::create_recommendation),
        )
        .route("/recommendations/random", get(handlers::get_random_recommendation))
        .route("/recommendations/top/:amount", get(handlers::get_top_recommendations))
        .route("/recommendations/:id", get(handlers::get_recommendation))
        .route("/recommendations/:id/upvote", post(handlers::upvote))
        .route("/recommendations/:id/downvote", post(handlers::downvote))
        // Outermost layer runs first, so the request id exists before the span is made
        .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
