use std::sync::Arc;

use axum::{
    http::StatusCode,
    middleware,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    middleware::request_id::{make_span_with_request_id, request_id_middleware},
    services::{Session, WatchedList},
};

pub mod movies;
pub mod session;
pub mod watched;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub session: Session,
}

impl AppState {
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    pub fn watched(&self) -> &Arc<WatchedList> {
        self.session.watched()
    }
}

/// Creates the application router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes())
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id)),
        )
        .layer(CorsLayer::permissive())
}

/// API routes under /api/v1
fn api_routes() -> Router<AppState> {
    Router::new()
        // Stateless lookups
        .route("/movies/search", get(movies::search))
        .route("/movies/:id", get(movies::detail))
        // Watched list
        .route("/watched", get(watched::list).post(watched::add))
        .route("/watched/summary", get(watched::summary))
        .route("/watched/:id", delete(watched::remove))
        // View session
        .route("/session", get(session::snapshot))
        .route("/session/query", put(session::set_query))
        .route("/session/select", post(session::select))
        .route("/session/close", post(session::close))
        .route("/session/rating", post(session::rate))
        .route("/session/confirm", post(session::confirm))
        .route("/session/keys", post(session::press_key))
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
