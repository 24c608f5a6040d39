use std::sync::{Arc, Mutex};

use serde::Serialize;

use crate::{
    error::{AppError, AppResult},
    models::{WatchedEntry, WatchedSummary},
    services::{
        detail::{DetailFetcher, DetailSnapshot, Selection},
        providers::MovieProvider,
        search::{SearchFetcher, SearchIssued, SearchSnapshot},
        view::{Key, KeyListeners, ListenerAction, ListenerRegistration, PageTitle},
        watched::WatchedList,
    },
};

/// Where keyboard focus currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Focus {
    SearchInput,
    Page,
}

/// Everything the single-page view renders
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    #[serde(flatten)]
    pub search: SearchSnapshot,
    pub num_results: usize,
    pub detail: DetailSnapshot,
    /// Whether the movie in the detail panel is already watched
    pub is_watched: bool,
    /// Rating stored for the movie in the detail panel
    pub watched_rating: Option<u8>,
    pub page_title: String,
    pub focus: Focus,
    pub watched: Vec<WatchedEntry>,
    pub summary: WatchedSummary,
}

/// The view session: search bar, result list, detail panel and watched list.
///
/// The search bar's Enter listener is registered for the lifetime of the
/// session; the detail panel registers its own Escape listener.
#[derive(Clone)]
pub struct Session {
    search: SearchFetcher,
    detail: DetailFetcher,
    watched: Arc<WatchedList>,
    page_title: PageTitle,
    listeners: KeyListeners,
    focus: Arc<Mutex<Focus>>,
    _search_bar: Arc<ListenerRegistration>,
}

impl Session {
    pub fn new(
        provider: Arc<dyn MovieProvider>,
        watched: Arc<WatchedList>,
        min_query_length: usize,
        default_page_title: &str,
    ) -> Self {
        let page_title = PageTitle::new(default_page_title);
        let listeners = KeyListeners::new();
        let search_bar = listeners.register(Key::Enter, ListenerAction::FocusSearch);

        Self {
            search: SearchFetcher::new(provider.clone(), min_query_length),
            detail: DetailFetcher::new(provider, page_title.clone(), listeners.clone()),
            watched,
            page_title,
            listeners,
            focus: Arc::new(Mutex::new(Focus::Page)),
            _search_bar: Arc::new(search_bar),
        }
    }

    pub fn search(&self) -> &SearchFetcher {
        &self.search
    }

    pub fn detail(&self) -> &DetailFetcher {
        &self.detail
    }

    pub fn watched(&self) -> &Arc<WatchedList> {
        &self.watched
    }

    fn focus(&self) -> Focus {
        *self.focus.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn set_focus(&self, focus: Focus) {
        *self.focus.lock().unwrap_or_else(|e| e.into_inner()) = focus;
    }

    /// Typing into the search bar. A search that starts closes the detail panel.
    pub async fn set_query(&self, query: impl Into<String>) -> SearchIssued {
        self.set_focus(Focus::SearchInput);
        let issued = self.search.set_query(query).await;
        if issued == SearchIssued::Started {
            self.detail.close().await;
        }
        issued
    }

    /// Clicking a result: toggles the detail panel for `imdb_id`
    pub async fn select(&self, imdb_id: &str) -> Selection {
        self.set_focus(Focus::Page);
        self.detail.select(imdb_id).await
    }

    /// The back button
    pub async fn close(&self) -> bool {
        self.detail.close().await
    }

    pub async fn rate(&self, rating: u8) -> AppResult<u32> {
        if let Some(imdb_id) = self.detail.selected_id().await {
            if let Some(existing) = self.watched.rating_of(&imdb_id).await {
                return Err(AppError::Conflict(format!(
                    "Movie {} is already rated {}",
                    imdb_id, existing
                )));
            }
        }
        self.detail.rate(rating).await
    }

    /// "Mark as watched": stores the rated movie and closes the panel
    pub async fn confirm(&self) -> AppResult<WatchedEntry> {
        let draft = self
            .detail
            .draft()
            .await
            .ok_or_else(|| AppError::Conflict("No movie is loaded".to_string()))?;

        let user_rating = draft.user_rating.ok_or_else(|| {
            AppError::InvalidInput("Rate the movie before marking it as watched".to_string())
        })?;

        let entry = WatchedEntry::from_detail(&draft.movie, user_rating, draft.rating_decisions);
        if !self.watched.add_if_absent(entry.clone()).await? {
            return Err(AppError::Conflict(format!(
                "Movie {} is already watched",
                entry.imdb_id
            )));
        }
        self.detail.close().await;

        Ok(entry)
    }

    /// Delivers a global key press to the live listeners.
    ///
    /// Returns the actions that took effect.
    pub async fn press_key(&self, key: Key) -> Vec<ListenerAction> {
        let mut fired = Vec::new();

        for action in self.listeners.dispatch(key) {
            match action {
                ListenerAction::CloseDetail => {
                    if self.detail.close().await {
                        fired.push(action);
                    }
                }
                ListenerAction::FocusSearch => {
                    if self.focus() == Focus::SearchInput {
                        continue;
                    }
                    self.set_focus(Focus::SearchInput);
                    self.search.set_query("").await;
                    fired.push(action);
                }
            }
        }

        tracing::debug!(?key, ?fired, "Key press handled");
        fired
    }

    /// Waits for the in-flight search and detail load to settle
    pub async fn settled(&self) {
        self.search.settled().await;
        self.detail.settled().await;
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let search = self.search.snapshot().await;
        let detail = self.detail.snapshot().await;

        let watched_rating = match &detail.imdb_id {
            Some(id) => self.watched.rating_of(id).await,
            None => None,
        };

        SessionSnapshot {
            num_results: search.results.len(),
            search,
            detail,
            is_watched: watched_rating.is_some(),
            watched_rating,
            page_title: self.page_title.current(),
            focus: self.focus(),
            watched: self.watched.entries().await,
            summary: self.watched.summary().await,
        }
    }

    /// Tears the view down: cancels in-flight work and closes the panel
    pub async fn shutdown(&self) {
        self.search.shutdown().await;
        self.detail.close().await;
        tracing::info!("View session shut down");
    }
}
