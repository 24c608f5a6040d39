use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::{AppError, AppResult},
    models::{WatchedEntry, WatchedSummary},
    routes::AppState,
    services::detail::{MAX_USER_RATING, MIN_USER_RATING},
};

/// Get the watched list in insertion order
pub async fn list(State(state): State<AppState>) -> Json<Vec<WatchedEntry>> {
    Json(state.watched().entries().await)
}

/// Add a watched movie; an id that is already present is a conflict
pub async fn add(
    State(state): State<AppState>,
    Json(entry): Json<WatchedEntry>,
) -> AppResult<(StatusCode, Json<WatchedEntry>)> {
    if !(MIN_USER_RATING..=MAX_USER_RATING).contains(&entry.user_rating) {
        return Err(AppError::InvalidInput(format!(
            "user_rating must be between {} and {}",
            MIN_USER_RATING, MAX_USER_RATING
        )));
    }

    if !state.watched().add_if_absent(entry.clone()).await? {
        return Err(AppError::Conflict(format!(
            "Movie {} is already watched",
            entry.imdb_id
        )));
    }

    Ok((StatusCode::CREATED, Json(entry)))
}

/// Remove every entry for a movie
pub async fn remove(
    State(state): State<AppState>,
    Path(imdb_id): Path<String>,
) -> AppResult<StatusCode> {
    state.watched().remove(&imdb_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn summary(State(state): State<AppState>) -> Json<WatchedSummary> {
    Json(state.watched().summary().await)
}
