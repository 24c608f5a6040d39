use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{watch, RwLock};
use tokio_util::sync::CancellationToken;

use crate::{
    error::{AppError, AppResult, FetchError},
    models::MovieDetail,
    services::{
        providers::MovieProvider,
        view::{Key, KeyListeners, ListenerAction, ListenerRegistration, PageTitle, TitleGuard},
        ActiveRequest,
    },
};

pub const MIN_USER_RATING: u8 = 1;
pub const MAX_USER_RATING: u8 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DetailStatus {
    Closed,
    Loading,
    Loaded,
    Failed,
}

/// What the detail panel currently shows
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DetailSnapshot {
    pub status: DetailStatus,
    pub imdb_id: Option<String>,
    pub movie: Option<MovieDetail>,
    pub user_rating: Option<u8>,
    pub rating_decisions: u32,
    pub error: Option<String>,
}

/// A loaded movie together with the rating being chosen for it
#[derive(Debug, Clone, PartialEq)]
pub struct RatingDraft {
    pub movie: MovieDetail,
    pub user_rating: Option<u8>,
    pub rating_decisions: u32,
}

/// Whether a selection opened or closed the panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Opened,
    Closed,
}

enum DetailState {
    Closed,
    Loading {
        imdb_id: String,
        request: ActiveRequest,
        escape: ListenerRegistration,
    },
    Loaded {
        draft: RatingDraft,
        _title: Option<TitleGuard>,
        escape: ListenerRegistration,
    },
    Failed {
        imdb_id: String,
        error: String,
        escape: ListenerRegistration,
    },
}

impl DetailState {
    fn imdb_id(&self) -> Option<&str> {
        match self {
            DetailState::Closed => None,
            DetailState::Loading { imdb_id, .. } | DetailState::Failed { imdb_id, .. } => Some(imdb_id),
            DetailState::Loaded { draft, .. } => Some(&draft.movie.imdb_id),
        }
    }

    /// Gives back the Escape listener of an open panel, dropping everything else
    fn into_escape(self) -> Option<ListenerRegistration> {
        match self {
            DetailState::Closed => None,
            DetailState::Loading { escape, .. }
            | DetailState::Loaded { escape, .. }
            | DetailState::Failed { escape, .. } => Some(escape),
        }
    }
}

/// Loads the selected movie and owns the detail panel state.
///
/// Opening the panel registers the Escape listener; a loaded movie holds the
/// page title. Both are released when the state leaves the panel, so closing
/// by any path restores them. Selecting another movie cancels the pending
/// load so a late answer cannot replace a newer selection.
#[derive(Clone)]
pub struct DetailFetcher {
    provider: Arc<dyn MovieProvider>,
    page_title: PageTitle,
    listeners: KeyListeners,
    state: Arc<RwLock<DetailState>>,
    settled: Arc<watch::Sender<u64>>,
}

impl DetailFetcher {
    pub fn new(provider: Arc<dyn MovieProvider>, page_title: PageTitle, listeners: KeyListeners) -> Self {
        let (settled, _) = watch::channel(0);
        Self {
            provider,
            page_title,
            listeners,
            state: Arc::new(RwLock::new(DetailState::Closed)),
            settled: Arc::new(settled),
        }
    }

    /// Opens `imdb_id`, or closes the panel if it is already the selection
    pub async fn select(&self, imdb_id: &str) -> Selection {
        let mut state = self.state.write().await;
        if state.imdb_id() == Some(imdb_id) {
            let previous = std::mem::replace(&mut *state, DetailState::Closed);
            drop(state);
            self.release(previous);
            Selection::Closed
        } else {
            self.start_load(&mut state, imdb_id);
            Selection::Opened
        }
    }

    /// Starts loading `imdb_id`, even when it is already shown
    pub async fn open(&self, imdb_id: &str) {
        let mut state = self.state.write().await;
        self.start_load(&mut state, imdb_id);
    }

    /// Replaces the panel with a load of `imdb_id`. The caller holds the write lock.
    fn start_load(&self, state: &mut DetailState, imdb_id: &str) {
        let previous = std::mem::replace(state, DetailState::Closed);
        if matches!(previous, DetailState::Loading { .. }) {
            tracing::debug!(imdb_id = %imdb_id, "Superseding pending detail load");
        }
        let escape = previous
            .into_escape()
            .unwrap_or_else(|| self.listeners.register(Key::Escape, ListenerAction::CloseDetail));

        let token = CancellationToken::new();
        let handle = tokio::spawn(Self::run(
            self.provider.clone(),
            self.state.clone(),
            self.page_title.clone(),
            self.settled.clone(),
            imdb_id.to_string(),
            token.clone(),
        ));

        *state = DetailState::Loading {
            imdb_id: imdb_id.to_string(),
            request: ActiveRequest::new(token, handle),
            escape,
        };
    }

    async fn run(
        provider: Arc<dyn MovieProvider>,
        state: Arc<RwLock<DetailState>>,
        page_title: PageTitle,
        settled: Arc<watch::Sender<u64>>,
        imdb_id: String,
        token: CancellationToken,
    ) {
        let outcome = tokio::select! {
            biased;
            _ = token.cancelled() => {
                tracing::debug!(imdb_id = %imdb_id, "Detail load cancelled");
                return;
            }
            outcome = provider.fetch_detail(&imdb_id) => outcome,
        };

        let mut state = state.write().await;
        if token.is_cancelled() {
            tracing::debug!(imdb_id = %imdb_id, "Discarding response of superseded detail load");
            return;
        }

        let escape = match std::mem::replace(&mut *state, DetailState::Closed) {
            DetailState::Loading { escape, .. } => escape,
            other => {
                *state = other;
                return;
            }
        };

        *state = match outcome {
            Ok(movie) => {
                let title = (!movie.title.is_empty()).then(|| page_title.show_movie(&movie.title));
                DetailState::Loaded {
                    draft: RatingDraft {
                        movie,
                        user_rating: None,
                        rating_decisions: 0,
                    },
                    _title: title,
                    escape,
                }
            }
            Err(e) => {
                if let FetchError::Transport(detail) = &e {
                    tracing::warn!(imdb_id = %imdb_id, detail = %detail, "Detail request failed");
                }
                DetailState::Failed {
                    imdb_id,
                    error: e.to_string(),
                    escape,
                }
            }
        };
        drop(state);

        settled.send_modify(|n| *n += 1);
    }

    /// Closes the panel. Returns whether it was open.
    pub async fn close(&self) -> bool {
        let previous = {
            let mut state = self.state.write().await;
            std::mem::replace(&mut *state, DetailState::Closed)
        };
        self.release(previous)
    }

    /// Tears down a panel state that was taken out of the lock
    fn release(&self, previous: DetailState) -> bool {
        let was_open = !matches!(previous, DetailState::Closed);
        if let DetailState::Loading { request, .. } = previous {
            request.cancel();
        }
        self.settled.send_modify(|n| *n += 1);

        if was_open {
            tracing::debug!("Detail panel closed");
        }
        was_open
    }

    /// Records a rating for the loaded movie and returns the revision count
    pub async fn rate(&self, rating: u8) -> AppResult<u32> {
        if !(MIN_USER_RATING..=MAX_USER_RATING).contains(&rating) {
            return Err(AppError::InvalidInput(format!(
                "Rating must be between {} and {}",
                MIN_USER_RATING, MAX_USER_RATING
            )));
        }

        let mut state = self.state.write().await;
        match &mut *state {
            DetailState::Loaded { draft, .. } => {
                if draft.user_rating != Some(rating) {
                    draft.user_rating = Some(rating);
                    draft.rating_decisions += 1;
                }
                Ok(draft.rating_decisions)
            }
            _ => Err(AppError::Conflict("No movie is loaded".to_string())),
        }
    }

    /// The loaded movie and its rating, if the panel shows one
    pub async fn draft(&self) -> Option<RatingDraft> {
        match &*self.state.read().await {
            DetailState::Loaded { draft, .. } => Some(draft.clone()),
            _ => None,
        }
    }

    pub async fn selected_id(&self) -> Option<String> {
        self.state.read().await.imdb_id().map(str::to_string)
    }

    /// Waits until no detail load is in flight
    pub async fn settled(&self) {
        let mut rx = self.settled.subscribe();
        loop {
            if !matches!(*self.state.read().await, DetailState::Loading { .. }) {
                return;
            }
            if rx.changed().await.is_err() {
                return;
            }
        }
    }

    /// One-off lookup that bypasses the panel state
    pub async fn fetch_once(&self, imdb_id: &str) -> Result<MovieDetail, FetchError> {
        self.provider.fetch_detail(imdb_id).await
    }

    pub async fn snapshot(&self) -> DetailSnapshot {
        let state = self.state.read().await;
        let mut snapshot = DetailSnapshot {
            status: DetailStatus::Closed,
            imdb_id: state.imdb_id().map(str::to_string),
            movie: None,
            user_rating: None,
            rating_decisions: 0,
            error: None,
        };

        match &*state {
            DetailState::Closed => {}
            DetailState::Loading { .. } => snapshot.status = DetailStatus::Loading,
            DetailState::Loaded { draft, .. } => {
                snapshot.status = DetailStatus::Loaded;
                snapshot.movie = Some(draft.movie.clone());
                snapshot.user_rating = draft.user_rating;
                snapshot.rating_decisions = draft.rating_decisions;
            }
            DetailState::Failed { error, .. } => {
                snapshot.status = DetailStatus::Failed;
                snapshot.error = Some(error.clone());
            }
        }

        snapshot
    }
}
