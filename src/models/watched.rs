use serde::{Deserialize, Serialize};

use super::MovieDetail;

/// A movie the user has rated and marked as watched
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WatchedEntry {
    pub imdb_id: String,
    pub title: String,
    pub year: String,
    pub poster: String,
    /// `None` when upstream reported "N/A"
    pub imdb_rating: Option<f64>,
    /// Runtime in minutes, `None` when upstream reported "N/A"
    pub runtime: Option<u32>,
    /// The user's own rating, 1..=10
    pub user_rating: u8,
    /// How many times the rating changed before it was confirmed
    pub rating_decisions: u32,
}

impl WatchedEntry {
    pub fn from_detail(detail: &MovieDetail, user_rating: u8, rating_decisions: u32) -> Self {
        Self {
            imdb_id: detail.imdb_id.clone(),
            title: detail.title.clone(),
            year: detail.year.clone(),
            poster: detail.poster.clone(),
            imdb_rating: detail.imdb_rating_value(),
            runtime: detail.runtime_minutes,
            user_rating,
            rating_decisions,
        }
    }
}

/// Aggregates shown above the watched list
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct WatchedSummary {
    pub count: usize,
    pub avg_imdb_rating: f64,
    pub avg_user_rating: f64,
    pub avg_runtime: f64,
}

impl WatchedSummary {
    pub fn from_entries(entries: &[WatchedEntry]) -> Self {
        Self {
            count: entries.len(),
            avg_imdb_rating: average(entries.iter().filter_map(|e| e.imdb_rating)),
            avg_user_rating: average(entries.iter().map(|e| f64::from(e.user_rating))),
            avg_runtime: average(entries.iter().filter_map(|e| e.runtime.map(f64::from))),
        }
    }
}

/// Mean of the values, 0 for an empty input
fn average(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}
