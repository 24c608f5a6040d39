use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Which backend holds the persisted watched list
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    File,
    Redis,
    Memory,
}

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// OMDb API key
    pub omdb_api_key: String,

    /// OMDb API base URL, shared by the search and detail endpoints
    #[serde(default = "default_omdb_api_url")]
    pub omdb_api_url: String,

    /// Timeout applied to every outbound OMDb request
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Queries shorter than this (after trimming) never reach the network
    #[serde(default = "default_min_query_length")]
    pub min_query_length: usize,

    /// Page title shown while no movie detail is open
    #[serde(default = "default_page_title")]
    pub default_page_title: String,

    #[serde(default = "default_store_backend")]
    pub store_backend: StoreBackend,

    /// Directory used by the file store
    #[serde(default = "default_store_dir")]
    pub store_dir: PathBuf,

    /// Redis connection URL
    #[serde(default = "default_redis_url")]
    pub redis_url: String,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Settings handed to the OMDb provider at construction time
#[derive(Debug, Clone)]
pub struct OmdbConfig {
    pub api_key: String,
    pub api_url: String,
    pub timeout: Duration,
}

fn default_omdb_api_url() -> String {
    "https://www.omdbapi.com/".to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_min_query_length() -> usize {
    4
}

fn default_page_title() -> String {
    "usePopcorn".to_string()
}

fn default_store_backend() -> StoreBackend {
    StoreBackend::File
}

fn default_store_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_iter(std::env::vars())
    }

    /// Load configuration from an explicit set of variables
    pub fn from_iter<I>(vars: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let config = envy::from_iter::<_, Config>(vars)
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

        if config.omdb_api_key.trim().is_empty() {
            anyhow::bail!("Failed to load config: OMDB_API_KEY is empty");
        }

        Ok(config)
    }

    pub fn omdb(&self) -> OmdbConfig {
        OmdbConfig {
            api_key: self.omdb_api_key.clone(),
            api_url: self.omdb_api_url.clone(),
            timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
