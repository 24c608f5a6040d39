/// Movie database abstraction
///
/// Search and detail lookups go through this trait so the fetchers never
/// depend on a concrete HTTP API. OMDb is the only production provider.
use crate::{
    error::FetchError,
    models::{MovieDetail, MovieSummary},
};

pub mod omdb;

pub use omdb::OmdbProvider;

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait MovieProvider: Send + Sync {
    /// Search for movies by title.
    ///
    /// A successful answer with no matches is `FetchError::NotAvailable`,
    /// never an empty `Ok`.
    async fn search(&self, query: &str) -> Result<Vec<MovieSummary>, FetchError>;

    /// Fetch full details for one IMDb ID
    async fn fetch_detail(&self, imdb_id: &str) -> Result<MovieDetail, FetchError>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}
