//! Fake OMDb server and router fixtures for the integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use axum_test::TestServer;
use serde_json::{json, Value};

use popcorn_api::{
    config::OmdbConfig,
    routes::{create_router, AppState},
    services::{OmdbProvider, Session, WatchedList},
    store::{MemoryStore, PersistedStore},
};

pub const API_KEY: &str = "test_key";

/// Delay of the "slow panda" search, long enough to be overtaken
pub const SLOW_SEARCH: Duration = Duration::from_millis(300);

#[derive(Clone, Default)]
struct FakeState {
    searches: Arc<AtomicUsize>,
    details: Arc<AtomicUsize>,
}

/// An OMDb look-alike listening on an ephemeral local port
pub struct FakeOmdb {
    pub url: String,
    state: FakeState,
}

impl FakeOmdb {
    pub async fn start() -> Self {
        let state = FakeState::default();
        let app = Router::new().route("/", get(omdb)).with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            url: format!("http://{}/", addr),
            state,
        }
    }

    pub fn config(&self) -> OmdbConfig {
        OmdbConfig {
            api_key: API_KEY.to_string(),
            api_url: self.url.clone(),
            timeout: Duration::from_secs(5),
        }
    }

    pub fn provider(&self) -> OmdbProvider {
        OmdbProvider::new(self.config()).unwrap()
    }

    pub fn search_requests(&self) -> usize {
        self.state.searches.load(Ordering::SeqCst)
    }

    pub fn detail_requests(&self) -> usize {
        self.state.details.load(Ordering::SeqCst)
    }
}

async fn omdb(
    State(state): State<FakeState>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    if params.get("apikey").map(String::as_str) != Some(API_KEY) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"Response": "False", "Error": "Invalid API key!"})),
        );
    }

    if let Some(query) = params.get("s") {
        state.searches.fetch_add(1, Ordering::SeqCst);
        return search_response(query).await;
    }

    if let Some(id) = params.get("i") {
        state.details.fetch_add(1, Ordering::SeqCst);
        return (StatusCode::OK, Json(detail_response(id)));
    }

    (
        StatusCode::OK,
        Json(json!({"Response": "False", "Error": "Something went wrong."})),
    )
}

async fn search_response(query: &str) -> (StatusCode, Json<Value>) {
    match query {
        "boom" => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"Error": "upstream exploded"})),
        ),
        "panda" | "slow panda" => {
            if query == "slow panda" {
                tokio::time::sleep(SLOW_SEARCH).await;
            }
            (
                StatusCode::OK,
                Json(json!({
                    "Search": [
                        {"Title": "Kung Fu Panda", "Year": "2008", "imdbID": "tt0441773", "Type": "movie", "Poster": "https://img/kfp.jpg"},
                        {"Title": "Kung Fu Panda 2", "Year": "2011", "imdbID": "tt1302011", "Type": "movie", "Poster": "https://img/kfp2.jpg"}
                    ],
                    "totalResults": "2",
                    "Response": "True"
                })),
            )
        }
        "inception" => (
            StatusCode::OK,
            Json(json!({
                "Search": [
                    {"Title": "Inception", "Year": "2010", "imdbID": "tt1375666", "Type": "movie", "Poster": "https://img/inception.jpg"}
                ],
                "totalResults": "1",
                "Response": "True"
            })),
        ),
        _ => (
            StatusCode::OK,
            Json(json!({"Response": "False", "Error": "Movie not found!"})),
        ),
    }
}

fn detail_response(id: &str) -> Value {
    match id {
        "tt0441773" => json!({
            "Title": "Kung Fu Panda",
            "Year": "2008",
            "Released": "06 Jun 2008",
            "Runtime": "92 min",
            "Genre": "Animation, Action, Adventure",
            "Director": "Mark Osborne, John Stevenson",
            "Actors": "Jack Black, Ian McShane, Angelina Jolie",
            "Plot": "To everyone's surprise, Po is chosen to fulfill an ancient prophecy.",
            "Poster": "https://img/kfp.jpg",
            "imdbRating": "7.6",
            "imdbID": "tt0441773",
            "Response": "True"
        }),
        "tt1375666" => json!({
            "Title": "Inception",
            "Year": "2010",
            "Released": "16 Jul 2010",
            "Runtime": "148 min",
            "Genre": "Action, Adventure, Sci-Fi",
            "Director": "Christopher Nolan",
            "Actors": "Leonardo DiCaprio, Joseph Gordon-Levitt, Elliot Page",
            "Plot": "A thief who steals corporate secrets through dream-sharing technology.",
            "Poster": "https://img/inception.jpg",
            "imdbRating": "8.8",
            "imdbID": "tt1375666",
            "Response": "True"
        }),
        _ => json!({"Response": "False", "Error": "Incorrect IMDb ID."}),
    }
}

/// Router wired to a fresh fake OMDb and an in-memory store
pub struct TestApp {
    pub server: TestServer,
    pub omdb: FakeOmdb,
    pub store: PersistedStore,
    pub session: Session,
}

impl TestApp {
    pub async fn new() -> Self {
        let omdb = FakeOmdb::start().await;
        let store = PersistedStore::new(Arc::new(MemoryStore::new()));
        let watched = Arc::new(WatchedList::load(store.clone()).await.unwrap());
        let session = Session::new(Arc::new(omdb.provider()), watched, 4, "usePopcorn");

        let server = TestServer::new(create_router(AppState::new(session.clone()))).unwrap();

        Self {
            server,
            omdb,
            store,
            session,
        }
    }
}

pub fn watched_entry(id: &str, title: &str, user_rating: u8) -> Value {
    json!({
        "imdb_id": id,
        "title": title,
        "year": "2010",
        "poster": "N/A",
        "imdb_rating": 8.0,
        "runtime": 120,
        "user_rating": user_rating,
        "rating_decisions": 1
    })
}
