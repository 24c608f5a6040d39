use serde::{Deserialize, Serialize};

pub mod watched;

pub use watched::{WatchedEntry, WatchedSummary};

/// One row of a search result set
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovieSummary {
    /// IMDb ID (e.g., "tt1375666")
    pub imdb_id: String,
    pub title: String,
    /// Release year as reported upstream; series use ranges like "2008–2013"
    pub year: String,
    pub poster: String,
}

/// Full details for a single movie, fetched when a summary is selected
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovieDetail {
    pub imdb_id: String,
    pub title: String,
    pub year: String,
    pub plot: String,
    pub poster: String,
    /// Raw runtime text, e.g. "148 min"
    pub runtime: String,
    /// Minutes parsed from `runtime`
    pub runtime_minutes: Option<u32>,
    /// Raw IMDb rating text, e.g. "8.8"
    pub imdb_rating: String,
    pub director: String,
    pub released: String,
    pub actors: String,
    pub genre: String,
}

impl MovieDetail {
    /// IMDb rating as a number, `None` for "N/A"
    pub fn imdb_rating_value(&self) -> Option<f64> {
        parse_rating(&self.imdb_rating)
    }
}

/// Parses the leading integer of a runtime such as "148 min"
pub fn parse_runtime(runtime: &str) -> Option<u32> {
    runtime.split_whitespace().next()?.parse().ok()
}

pub fn parse_rating(rating: &str) -> Option<f64> {
    rating.trim().parse::<f64>().ok().filter(|r| r.is_finite())
}

// ============================================================================
// OMDb API Types
// ============================================================================

/// Envelope returned by `?s=<query>`
#[derive(Debug, Clone, Deserialize)]
pub struct OmdbSearchResponse {
    #[serde(rename = "Search", default)]
    pub search: Vec<OmdbSearchItem>,
    #[serde(rename = "Response", default)]
    pub response: Option<String>,
    #[serde(rename = "Error", default)]
    pub error: Option<String>,
}

impl OmdbSearchResponse {
    pub fn is_failure(&self) -> bool {
        is_false(self.response.as_deref())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OmdbSearchItem {
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Year", default)]
    pub year: String,
    #[serde(rename = "imdbID")]
    pub imdb_id: String,
    #[serde(rename = "Poster", default)]
    pub poster: String,
}

impl From<OmdbSearchItem> for MovieSummary {
    fn from(item: OmdbSearchItem) -> Self {
        MovieSummary {
            imdb_id: item.imdb_id,
            title: item.title,
            year: item.year,
            poster: item.poster,
        }
    }
}

/// Body returned by `?i=<imdb id>`. Every field is optional upstream.
#[derive(Debug, Clone, Deserialize)]
pub struct OmdbMovie {
    #[serde(rename = "Title", default)]
    pub title: String,
    #[serde(rename = "Year", default)]
    pub year: String,
    #[serde(rename = "Plot", default)]
    pub plot: String,
    #[serde(rename = "Poster", default)]
    pub poster: String,
    #[serde(rename = "Runtime", default)]
    pub runtime: String,
    #[serde(rename = "imdbRating", default)]
    pub imdb_rating: String,
    #[serde(rename = "imdbID", default)]
    pub imdb_id: String,
    #[serde(rename = "Director", default)]
    pub director: String,
    #[serde(rename = "Released", default)]
    pub released: String,
    #[serde(rename = "Actors", default)]
    pub actors: String,
    #[serde(rename = "Genre", default)]
    pub genre: String,
    #[serde(rename = "Response", default)]
    pub response: Option<String>,
    #[serde(rename = "Error", default)]
    pub error: Option<String>,
}

impl OmdbMovie {
    pub fn is_failure(&self) -> bool {
        is_false(self.response.as_deref())
    }

    /// Converts into a detail, keeping the requested id when upstream omits it
    pub fn into_detail(self, requested_id: &str) -> MovieDetail {
        let imdb_id = if self.imdb_id.is_empty() {
            requested_id.to_string()
        } else {
            self.imdb_id
        };

        MovieDetail {
            imdb_id,
            runtime_minutes: parse_runtime(&self.runtime),
            title: self.title,
            year: self.year,
            plot: self.plot,
            poster: self.poster,
            runtime: self.runtime,
            imdb_rating: self.imdb_rating,
            director: self.director,
            released: self.released,
            actors: self.actors,
            genre: self.genre,
        }
    }
}

fn is_false(response: Option<&str>) -> bool {
    response.is_some_and(|r| r.eq_ignore_ascii_case("false"))
}
