//! TMDB (The Movie Database) details client
//!
//! API Flow: `GET {api_url}/movie/{movie_id}?api_key=...&language=en-US` returns the
//! movie details record, of which only `poster_path` is used.
use crate::{
    error::{AppError, AppResult},
    models::{MovieId, TmdbMovieDetails},
    services::posters::MovieDetailsSource,
};
use reqwest::Client as HttpClient;
use std::time::Duration;

const LANGUAGE: &str = "en-US";

#[derive(Clone)]
pub struct TmdbClient {
    http_client: HttpClient,
    api_url: String,
}

impl TmdbClient {
    /// Creates a client whose every request is bounded by `timeout`
    pub fn new(api_url: String, timeout: Duration) -> AppResult<Self> {
        let http_client = HttpClient::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            api_url,
        })
    }

    fn details_url(&self, movie_id: MovieId) -> String {
        format!("{}/movie/{}", self.api_url.trim_end_matches('/'), movie_id)
    }
}

#[async_trait::async_trait]
impl MovieDetailsSource for TmdbClient {
    async fn fetch_details(
        &self,
        movie_id: MovieId,
        api_key: &str,
    ) -> AppResult<TmdbMovieDetails> {
        // Errors must not echo the URL: its query string carries the API key.
        let response = self
            .http_client
            .get(self.details_url(movie_id))
            .query(&[("api_key", api_key), ("language", LANGUAGE)])
            .send()
            .await
            .map_err(|e| AppError::HttpClient(e.without_url()))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(AppError::ExternalApi(format!(
                "TMDB API returned status {} for movie {}",
                status, movie_id
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| AppError::HttpClient(e.without_url()))?;

        serde_json::from_str(&body).map_err(|e| {
            tracing::debug!(
                movie_id = %movie_id,
                error = %e,
                response = %body,
                "Failed to deserialize TMDB response"
            );
            AppError::Decode(format!("Failed to parse TMDB response: {}", e))
        })
    }

    fn name(&self) -> &'static str {
        "tmdb"
    }
}
