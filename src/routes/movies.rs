use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;

use crate::{
    error::AppResult,
    middleware::request_id::RequestId,
    models::{MovieDetail, MovieSummary},
    routes::AppState,
};

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    q: String,
}

/// Handler for movie search; short queries answer `[]` without a lookup
pub async fn search(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Query(params): Query<SearchQuery>,
) -> AppResult<Json<Vec<MovieSummary>>> {
    tracing::info!(request_id = %request_id, query = %params.q, "Processing movie search");

    let movies = state.session.search().search_once(&params.q).await?;
    Ok(Json(movies))
}

/// Handler for a single movie's details
pub async fn detail(
    State(state): State<AppState>,
    Path(imdb_id): Path<String>,
) -> AppResult<Json<MovieDetail>> {
    let movie = state.session.detail().fetch_once(&imdb_id).await?;
    Ok(Json(movie))
}
