//! API Routes
//!
//! Configures the Axum router with all herd cache endpoints.

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    add_handler, delete_handler, get_handler, get_many_handler, health_handler, set_handler,
    set_many_handler, stats_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `PUT /set` - Store a value
/// - `PUT /add` - Store a value only if the key is absent
/// - `GET /get/:key` - Retrieve a value by key
/// - `POST /get_many` - Retrieve several values at once
/// - `PUT /set_many` - Store several values at once
/// - `DELETE /del/:key` - Delete a key
/// - `GET /stats` - Memory store statistics
/// - `GET /health` - Health check endpoint
///
/// # Middleware
/// - CORS: Allows any origin
/// - Tracing: Logs all requests
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/set", put(set_handler))
        .route("/add", put(add_handler))
        .route("/get/:key", get(get_handler))
        .route("/get_many", post(get_many_handler))
        .route("/set_many", put(set_many_handler))
        .route("/del/:key", delete(delete_handler))
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
