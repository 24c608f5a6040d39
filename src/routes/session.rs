use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use crate::{
    error::AppResult,
    models::WatchedEntry,
    routes::AppState,
    services::{detail::Selection, Key, SessionSnapshot},
};

// Request/Response types

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub query: String,
    /// Respond only after the search settled
    #[serde(default)]
    pub wait: bool,
}

#[derive(Debug, Deserialize)]
pub struct SelectRequest {
    pub id: String,
    #[serde(default)]
    pub wait: bool,
}

#[derive(Debug, Deserialize)]
pub struct RatingRequest {
    pub rating: u8,
}

#[derive(Debug, Serialize)]
pub struct RatingResponse {
    pub rating: u8,
    pub rating_decisions: u32,
}

#[derive(Debug, Deserialize)]
pub struct KeyRequest {
    pub key: Key,
}

// Handlers

/// Current state of the view session
pub async fn snapshot(State(state): State<AppState>) -> Json<SessionSnapshot> {
    Json(state.session.snapshot().await)
}

/// The user typed into the search bar
pub async fn set_query(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> Json<SessionSnapshot> {
    state.session.set_query(request.query).await;
    if request.wait {
        state.session.search().settled().await;
    }
    Json(state.session.snapshot().await)
}

/// The user clicked a result
pub async fn select(
    State(state): State<AppState>,
    Json(request): Json<SelectRequest>,
) -> Json<SessionSnapshot> {
    let selection = state.session.select(&request.id).await;
    if request.wait && selection == Selection::Opened {
        state.session.detail().settled().await;
    }
    Json(state.session.snapshot().await)
}

/// The back button of the detail panel
pub async fn close(State(state): State<AppState>) -> Json<SessionSnapshot> {
    state.session.close().await;
    Json(state.session.snapshot().await)
}

/// A star was clicked
pub async fn rate(
    State(state): State<AppState>,
    Json(request): Json<RatingRequest>,
) -> AppResult<Json<RatingResponse>> {
    let rating_decisions = state.session.rate(request.rating).await?;
    Ok(Json(RatingResponse {
        rating: request.rating,
        rating_decisions,
    }))
}

/// "Mark as watched"
pub async fn confirm(State(state): State<AppState>) -> AppResult<(StatusCode, Json<WatchedEntry>)> {
    let entry = state.session.confirm().await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

/// A global key press
pub async fn press_key(
    State(state): State<AppState>,
    Json(request): Json<KeyRequest>,
) -> Json<SessionSnapshot> {
    state.session.press_key(request.key).await;
    Json(state.session.snapshot().await)
}
