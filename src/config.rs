use serde::Deserialize;
use std::{path::PathBuf, time::Duration};

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// TMDB API key; posters fall back to the placeholder when unset
    #[serde(default)]
    pub tmdb_api_key: Option<String>,

    /// TMDB API base URL
    #[serde(default = "default_tmdb_api_url")]
    pub tmdb_api_url: String,

    /// TMDB image CDN base URL (size segment is appended per request)
    #[serde(default = "default_tmdb_image_url")]
    pub tmdb_image_url: String,

    /// Image shown when no poster can be resolved
    #[serde(default = "default_placeholder_poster_url")]
    pub placeholder_poster_url: String,

    /// Per-attempt timeout for poster lookups, in seconds
    #[serde(default = "default_poster_timeout_secs")]
    pub poster_timeout_secs: u64,

    /// Total attempts per poster lookup, including the first
    #[serde(default = "default_poster_max_attempts")]
    pub poster_max_attempts: u32,

    /// Fixed delay between poster attempts, in milliseconds
    #[serde(default = "default_poster_retry_delay_ms")]
    pub poster_retry_delay_ms: u64,

    /// Overall deadline for resolving all posters of one request, in seconds
    #[serde(default)]
    pub recommendation_deadline_secs: Option<u64>,

    /// Path to the catalog JSON file
    #[serde(default = "default_catalog_path")]
    pub catalog_path: PathBuf,

    /// Path to the gzip-compressed similarity matrix
    #[serde(default = "default_similarity_path")]
    pub similarity_path: PathBuf,

    /// Recommendations returned when the caller does not ask for a count
    #[serde(default = "default_recommendations")]
    pub default_recommendations: usize,

    /// Upper bound on the count a caller may ask for
    #[serde(default = "default_max_recommendations")]
    pub max_recommendations: usize,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_tmdb_api_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_tmdb_image_url() -> String {
    "https://image.tmdb.org/t/p".to_string()
}

fn default_placeholder_poster_url() -> String {
    "https://via.placeholder.com/300x450?text=No+Poster".to_string()
}

fn default_poster_timeout_secs() -> u64 {
    5
}

fn default_poster_max_attempts() -> u32 {
    3
}

fn default_poster_retry_delay_ms() -> u64 {
    500
}

fn default_catalog_path() -> PathBuf {
    PathBuf::from("movie_dict.json")
}

fn default_similarity_path() -> PathBuf {
    PathBuf::from("similarity.bin.gz")
}

fn default_recommendations() -> usize {
    5
}

fn default_max_recommendations() -> usize {
    20
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
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    /// The API key, treating a blank value the same as an unset one
    pub fn api_key(&self) -> Option<&str> {
        self.tmdb_api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }

    pub fn poster_timeout(&self) -> Duration {
        Duration::from_secs(self.poster_timeout_secs)
    }

    pub fn poster_retry_delay(&self) -> Duration {
        Duration::from_millis(self.poster_retry_delay_ms)
    }

    pub fn recommendation_deadline(&self) -> Option<Duration> {
        self.recommendation_deadline_secs.map(Duration::from_secs)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
