use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{watch, RwLock};
use tokio_util::sync::CancellationToken;

use crate::{
    error::FetchError,
    models::MovieSummary,
    services::{providers::MovieProvider, ActiveRequest},
};

/// Whether a query change reached the network
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchIssued {
    /// Below the minimum length: results reset, nothing requested
    Skipped,
    Started,
}

/// Point-in-time view of the search state
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SearchSnapshot {
    pub query: String,
    pub results: Vec<MovieSummary>,
    pub is_loading: bool,
    pub error: Option<String>,
}

#[derive(Default)]
struct SearchState {
    query: String,
    results: Vec<MovieSummary>,
    is_loading: bool,
    error: Option<String>,
    active: Option<ActiveRequest>,
}

/// Drives the result list from the current query.
///
/// At most one search is active. A query change cancels the active search
/// under the state lock, and a search only publishes its outcome while
/// holding the same lock with its token still live, so a superseded search
/// can never touch the results, the error or the loading flag.
#[derive(Clone)]
pub struct SearchFetcher {
    provider: Arc<dyn MovieProvider>,
    min_query_length: usize,
    state: Arc<RwLock<SearchState>>,
    settled: Arc<watch::Sender<u64>>,
}

impl SearchFetcher {
    pub fn new(provider: Arc<dyn MovieProvider>, min_query_length: usize) -> Self {
        let (settled, _) = watch::channel(0);
        Self {
            provider,
            min_query_length,
            state: Arc::new(RwLock::new(SearchState::default())),
            settled: Arc::new(settled),
        }
    }

    fn is_searchable(&self, query: &str) -> bool {
        query.trim().chars().count() >= self.min_query_length
    }

    /// Replaces the query and restarts the search for it
    pub async fn set_query(&self, query: impl Into<String>) -> SearchIssued {
        let query = query.into();
        let mut state = self.state.write().await;

        if let Some(active) = state.active.take() {
            tracing::debug!(previous = %state.query, next = %query, "Cancelling superseded search");
            active.cancel();
        }
        state.query = query.clone();

        if !self.is_searchable(&query) {
            state.results.clear();
            state.error = None;
            state.is_loading = false;
            drop(state);
            self.notify_settled();
            return SearchIssued::Skipped;
        }

        state.is_loading = true;
        state.error = None;

        let token = CancellationToken::new();
        let handle = tokio::spawn(Self::run(
            self.provider.clone(),
            self.state.clone(),
            self.settled.clone(),
            query.trim().to_string(),
            token.clone(),
        ));
        state.active = Some(ActiveRequest::new(token, handle));

        SearchIssued::Started
    }

    async fn run(
        provider: Arc<dyn MovieProvider>,
        state: Arc<RwLock<SearchState>>,
        settled: Arc<watch::Sender<u64>>,
        query: String,
        token: CancellationToken,
    ) {
        let outcome = tokio::select! {
            biased;
            _ = token.cancelled() => {
                tracing::debug!(query = %query, "Search cancelled before completion");
                return;
            }
            outcome = provider.search(&query) => outcome,
        };

        let mut state = state.write().await;
        if token.is_cancelled() {
            tracing::debug!(query = %query, "Discarding response of superseded search");
            return;
        }

        match outcome {
            Ok(movies) => {
                state.results = movies;
                state.error = None;
            }
            Err(e) => {
                if let FetchError::Transport(detail) = &e {
                    tracing::warn!(query = %query, detail = %detail, "Search request failed");
                }
                state.results.clear();
                state.error = Some(e.to_string());
            }
        }
        state.is_loading = false;
        state.active = None;
        drop(state);

        settled.send_modify(|n| *n += 1);
    }

    fn notify_settled(&self) {
        self.settled.send_modify(|n| *n += 1);
    }

    /// Waits until no search is in flight
    pub async fn settled(&self) {
        let mut rx = self.settled.subscribe();
        loop {
            if self.state.read().await.active.is_none() {
                return;
            }
            if rx.changed().await.is_err() {
                return;
            }
        }
    }

    /// One-off search that bypasses the session state, same length gate
    pub async fn search_once(&self, query: &str) -> Result<Vec<MovieSummary>, FetchError> {
        if !self.is_searchable(query) {
            return Ok(Vec::new());
        }
        self.provider.search(query.trim()).await
    }

    pub async fn snapshot(&self) -> SearchSnapshot {
        let state = self.state.read().await;
        SearchSnapshot {
            query: state.query.clone(),
            results: state.results.clone(),
            is_loading: state.is_loading,
            error: state.error.clone(),
        }
    }

    /// Cancels any in-flight search without touching the visible state
    pub async fn shutdown(&self) {
        if let Some(active) = self.state.write().await.active.take() {
            active.cancel();
        }
        self.notify_settled();
    }
}
