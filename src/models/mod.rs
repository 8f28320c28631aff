use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

mod movie;

pub use movie::{Movie, MovieId};

/// One recommended movie, ready for display
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recommendation {
    pub movie_id: MovieId,
    pub title: String,
    pub poster_url: String,
}

/// Response for a recommendation request, ordered from most to least similar
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationResponse {
    pub query: String,
    pub recommendations: Vec<Recommendation>,
}

/// Summary of the loaded catalog and similarity matrix
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogStats {
    pub movie_count: usize,
    pub matrix_dimension: usize,
    pub loaded_at: DateTime<Utc>,
}

// ============================================================================
// TMDB API Types
// ============================================================================

/// Subset of the TMDB `GET /movie/{id}` response that poster resolution needs
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TmdbMovieDetails {
    #[serde(default)]
    pub poster_path: Option<String>,
}
