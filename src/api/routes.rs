use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::request_id::{make_span_with_request_id, request_id_middleware};

use super::handlers;
use super::AppState;

/// Creates the main API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/api/v1", api_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(CorsLayer::permissive())
}

/// API routes under /api/v1
fn api_routes() -> Router<AppState> {
    Router::new()
        // Sign-in and profile
        .route("/sessions", post(handlers::sign_in))
        .route("/users/:user_id", get(handlers::get_user))
        .route("/users/:user_id/favorites", put(handlers::update_favorites))
        // Catalogs and likes
        .route("/catalogs/:kind", get(handlers::list_catalog))
        .route("/catalogs/:kind/genres", get(handlers::catalog_genres))
        .route("/users/:user_id/likes", post(handlers::toggle_like))
        // Recommendations
        .route("/users/:user_id/recommendations", get(handlers::recommend_all))
        .route("/users/:user_id/recommendations/:kind", get(handlers::recommend))
}
