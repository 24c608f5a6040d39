//! Test doubles shared by the service tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;

use crate::{
    error::FetchError,
    models::{MovieDetail, MovieSummary},
    services::providers::MovieProvider,
};

pub(crate) fn summary(id: &str, title: &str) -> MovieSummary {
    MovieSummary {
        imdb_id: id.to_string(),
        title: title.to_string(),
        year: "2008".to_string(),
        poster: "N/A".to_string(),
    }
}

pub(crate) fn detail(id: &str, title: &str) -> MovieDetail {
    MovieDetail {
        imdb_id: id.to_string(),
        title: title.to_string(),
        year: "2010".to_string(),
        plot: format!("The plot of {}", title),
        poster: "https://img/poster.jpg".to_string(),
        runtime: "148 min".to_string(),
        runtime_minutes: Some(148),
        imdb_rating: "8.8".to_string(),
        director: "Christopher Nolan".to_string(),
        released: "16 Jul 2010".to_string(),
        actors: "Leonardo DiCaprio".to_string(),
        genre: "Sci-Fi".to_string(),
    }
}

/// Provider with canned answers that can be held back per query or id
#[derive(Default)]
pub(crate) struct GatedProvider {
    searches: HashMap<String, Result<Vec<MovieSummary>, FetchError>>,
    details: HashMap<String, Result<MovieDetail, FetchError>>,
    gates: HashMap<String, Arc<Notify>>,
    pub(crate) calls: AtomicUsize,
    pub(crate) detail_calls: AtomicUsize,
}

impl GatedProvider {
    pub(crate) fn respond(mut self, query: &str, response: Result<Vec<MovieSummary>, FetchError>) -> Self {
        self.searches.insert(query.to_string(), response);
        self
    }

    pub(crate) fn respond_detail(mut self, id: &str, response: Result<MovieDetail, FetchError>) -> Self {
        self.details.insert(id.to_string(), response);
        self
    }

    /// Holds back the answer for `key` (a query or an id) until notified
    pub(crate) fn gate(mut self, key: &str) -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        self.gates.insert(key.to_string(), gate.clone());
        (self, gate)
    }

    async fn wait_gate(&self, key: &str) {
        if let Some(gate) = self.gates.get(key) {
            gate.notified().await;
        }
    }
}

#[async_trait::async_trait]
impl MovieProvider for GatedProvider {
    async fn search(&self, query: &str) -> Result<Vec<MovieSummary>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.wait_gate(query).await;
        self.searches
            .get(query)
            .cloned()
            .unwrap_or(Err(FetchError::NotAvailable))
    }

    async fn fetch_detail(&self, imdb_id: &str) -> Result<MovieDetail, FetchError> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        self.wait_gate(imdb_id).await;
        self.details
            .get(imdb_id)
            .cloned()
            .unwrap_or(Err(FetchError::NotAvailable))
    }

    fn name(&self) -> &'static str {
        "gated"
    }
}
