/// OMDb API provider
///
/// Both operations hit the same base URL and differ only by query parameter:
/// 1. Search: `?apikey=<key>&s=<query>` → `{Search: [...]}` or `{Response: "False"}`
/// 2. Detail: `?apikey=<key>&i=<imdb id>` → one movie object
use crate::{
    config::OmdbConfig,
    error::FetchError,
    models::{MovieDetail, MovieSummary, OmdbMovie, OmdbSearchResponse},
    services::providers::MovieProvider,
};
use reqwest::Client as HttpClient;
use serde::de::DeserializeOwned;

#[derive(Clone)]
pub struct OmdbProvider {
    http_client: HttpClient,
    config: OmdbConfig,
}

impl OmdbProvider {
    pub fn new(config: OmdbConfig) -> Result<Self, FetchError> {
        let http_client = HttpClient::builder().timeout(config.timeout).build()?;
        Ok(Self {
            http_client,
            config,
        })
    }

    /// Issues a GET against the base URL and decodes the JSON body
    async fn get_json<T: DeserializeOwned>(&self, params: &[(&str, &str)]) -> Result<T, FetchError> {
        let response = self
            .http_client
            .get(&self.config.api_url)
            .query(&[("apikey", self.config.api_key.as_str())])
            .query(params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Transport(format!(
                "OMDb API returned status {}: {}",
                status, body
            )));
        }

        let response_text = response.text().await?;
        serde_json::from_str(&response_text).map_err(|e| {
            tracing::error!(
                error = %e,
                response = %response_text,
                "Failed to deserialize OMDb response"
            );
            FetchError::Transport(format!("Failed to parse OMDb response: {}", e))
        })
    }
}

#[async_trait::async_trait]
impl MovieProvider for OmdbProvider {
    async fn search(&self, query: &str) -> Result<Vec<MovieSummary>, FetchError> {
        let body: OmdbSearchResponse = self.get_json(&[("s", query)]).await?;

        if body.is_failure() {
            tracing::info!(
                query = %query,
                reason = body.error.as_deref().unwrap_or("unknown"),
                provider = "omdb",
                "Search returned no movies"
            );
            return Err(FetchError::NotAvailable);
        }

        let movies: Vec<MovieSummary> = body.search.into_iter().map(MovieSummary::from).collect();

        tracing::info!(
            query = %query,
            results = movies.len(),
            provider = "omdb",
            "Movie search completed"
        );

        Ok(movies)
    }

    async fn fetch_detail(&self, imdb_id: &str) -> Result<MovieDetail, FetchError> {
        let body: OmdbMovie = self.get_json(&[("i", imdb_id)]).await?;

        if body.is_failure() {
            tracing::info!(
                imdb_id = %imdb_id,
                reason = body.error.as_deref().unwrap_or("unknown"),
                provider = "omdb",
                "Detail lookup returned no movie"
            );
            return Err(FetchError::NotAvailable);
        }

        let detail = body.into_detail(imdb_id);
        tracing::info!(imdb_id = %imdb_id, title = %detail.title, provider = "omdb", "Movie details fetched");

        Ok(detail)
    }

    fn name(&self) -> &'static str {
        "omdb"
    }
}
