use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub mod detail;
pub mod providers;
pub mod search;
pub mod session;
pub mod view;
pub mod watched;

#[cfg(test)]
pub(crate) mod testing;

pub use detail::{DetailFetcher, DetailSnapshot, DetailStatus};
pub use providers::{MovieProvider, OmdbProvider};
pub use search::{SearchFetcher, SearchIssued, SearchSnapshot};
pub use session::{Session, SessionSnapshot};
pub use view::{Key, KeyListeners, PageTitle};
pub use watched::WatchedList;

/// A spawned fetch that can be called off.
///
/// Dropping it cancels the token; `cancel` also aborts the task.
pub(crate) struct ActiveRequest {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl ActiveRequest {
    pub(crate) fn new(token: CancellationToken, handle: JoinHandle<()>) -> Self {
        Self { token, handle }
    }

    pub(crate) fn cancel(self) {
        self.handle.abort();
    }
}

impl Drop for ActiveRequest {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
