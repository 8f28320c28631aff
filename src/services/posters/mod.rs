//! Poster resolution
//!
//! Turns a movie's provider ID into a displayable image URL. The provider is an
//! unreliable third party, so every failure path ends in the placeholder image
//! and a broken provider degrades recommendations visually but never fails them.
use crate::{
    error::AppResult,
    models::{MovieId, TmdbMovieDetails},
};
use std::{sync::Arc, time::Duration};
use tracing::instrument;

pub mod tmdb;

pub use tmdb::TmdbClient;

/// Poster width segment of the image CDN path
const POSTER_SIZE: &str = "w500";

/// Source of movie details at the poster provider
///
/// Separated from the resolver so retry and fallback behaviour can be exercised
/// without a network.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait MovieDetailsSource: Send + Sync {
    /// Fetch the details record of a single movie
    async fn fetch_details(&self, movie_id: MovieId, api_key: &str)
        -> AppResult<TmdbMovieDetails>;

    /// Provider name for logging
    fn name(&self) -> &'static str;
}

/// Fixed-delay retry settings for poster lookups
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_millis(500),
        }
    }
}

#[derive(Clone)]
pub struct PosterResolver {
    source: Arc<dyn MovieDetailsSource>,
    api_key: Option<String>,
    image_base_url: String,
    placeholder_url: String,
    retry: RetryPolicy,
}

impl PosterResolver {
    pub fn new(
        source: Arc<dyn MovieDetailsSource>,
        api_key: Option<String>,
        image_base_url: String,
        placeholder_url: String,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            source,
            api_key,
            image_base_url,
            placeholder_url,
            retry,
        }
    }

    /// Resolves the poster URL of one movie. Never fails.
    #[instrument(skip(self))]
    pub async fn resolve(&self, movie_id: MovieId) -> String {
        let Some(api_key) = self.api_key.as_deref() else {
            tracing::debug!("No API key configured, using placeholder poster");
            return self.placeholder_url.clone();
        };

        match self.fetch_with_retry(movie_id, api_key).await {
            Ok(details) => match details.poster_path.filter(|p| !p.trim().is_empty()) {
                Some(path) => self.poster_url(&path),
                None => {
                    tracing::debug!("Movie has no poster, using placeholder");
                    self.placeholder_url.clone()
                }
            },
            Err(e) => {
                tracing::warn!(
                    provider = self.source.name(),
                    error = %e,
                    "Poster lookup failed, using placeholder"
                );
                self.placeholder_url.clone()
            }
        }
    }

    /// Resolves posters for several movies concurrently, preserving input order
    ///
    /// With a deadline, any poster still pending when it elapses degrades to the
    /// placeholder while the rest keep their results.
    pub async fn resolve_many(
        &self,
        movie_ids: Vec<MovieId>,
        deadline: Option<Duration>,
    ) -> Vec<String> {
        let mut tasks = Vec::with_capacity(movie_ids.len());

        for movie_id in movie_ids {
            let resolver = self.clone();
            let task = tokio::spawn(async move {
                match deadline {
                    Some(limit) => match tokio::time::timeout(limit, resolver.resolve(movie_id))
                        .await
                    {
                        Ok(url) => url,
                        Err(_) => {
                            tracing::warn!(
                                movie_id = %movie_id,
                                deadline_ms = limit.as_millis() as u64,
                                "Poster deadline exceeded, using placeholder"
                            );
                            resolver.placeholder_url.clone()
                        }
                    },
                    None => resolver.resolve(movie_id).await,
                }
            });
            tasks.push(task);
        }

        let mut urls = Vec::with_capacity(tasks.len());
        for task in tasks {
            match task.await {
                Ok(url) => urls.push(url),
                Err(e) => {
                    tracing::error!(error = %e, "Poster task join error");
                    urls.push(self.placeholder_url.clone());
                }
            }
        }

        urls
    }

    async fn fetch_with_retry(
        &self,
        movie_id: MovieId,
        api_key: &str,
    ) -> AppResult<TmdbMovieDetails> {
        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match self.source.fetch_details(movie_id, api_key).await {
                Ok(details) => return Ok(details),
                Err(e) if e.is_retryable() && attempt < max_attempts => {
                    tracing::warn!(
                        attempt,
                        max_attempts,
                        error = %e,
                        "Poster lookup attempt failed, retrying"
                    );
                    tokio::time::sleep(self.retry.delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn poster_url(&self, poster_path: &str) -> String {
        let base = self.image_base_url.trim_end_matches('/');
        if poster_path.starts_with('/') {
            format!("{}/{}{}", base, POSTER_SIZE, poster_path)
        } else {
            format!("{}/{}/{}", base, POSTER_SIZE, poster_path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    const IMAGE_BASE: &str = "https://image.tmdb.org/t/p";
    const PLACEHOLDER: &str = "https://via.placeholder.com/300x450?text=No+Poster";

    fn no_delay() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            delay: Duration::ZERO,
        }
    }

    fn resolver(source: MockMovieDetailsSource, api_key: Option<&str>) -> PosterResolver {
        PosterResolver::new(
            Arc::new(source),
            api_key.map(str::to_string),
            IMAGE_BASE.to_string(),
            PLACEHOLDER.to_string(),
            no_delay(),
        )
    }

    fn mock_source() -> MockMovieDetailsSource {
        let mut source = MockMovieDetailsSource::new();
        source.expect_name().return_const("mock");
        source
    }

    fn details(poster_path: Option<&str>) -> TmdbMovieDetails {
        TmdbMovieDetails {
            poster_path: poster_path.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_no_api_key_skips_network() {
        let mut source = mock_source();
        source.expect_fetch_details().times(0);

        let url = resolver(source, None).resolve(MovieId(1)).await;
        assert_eq!(url, PLACEHOLDER);
    }

    #[tokio::test]
    async fn test_poster_path_is_joined_onto_image_base() {
        let mut source = mock_source();
        source
            .expect_fetch_details()
            .withf(|id, key| *id == MovieId(19995) && key == "secret")
            .times(1)
            .returning(|_, _| Ok(details(Some("/x.jpg"))));

        let url = resolver(source, Some("secret")).resolve(MovieId(19995)).await;
        assert_eq!(url, "https://image.tmdb.org/t/p/w500/x.jpg");
    }

    #[tokio::test]
    async fn test_missing_poster_path_is_not_retried() {
        let mut source = mock_source();
        source
            .expect_fetch_details()
            .times(1)
            .returning(|_, _| Ok(details(None)));

        let url = resolver(source, Some("secret")).resolve(MovieId(1)).await;
        assert_eq!(url, PLACEHOLDER);
    }

    #[tokio::test]
    async fn test_all_attempts_time_out() {
        let mut source = mock_source();
        source
            .expect_fetch_details()
            .times(3)
            .returning(|_, _| Err(AppError::ExternalApi("operation timed out".to_string())));

        let url = resolver(source, Some("secret")).resolve(MovieId(1)).await;
        assert_eq!(url, PLACEHOLDER);
    }

    #[tokio::test]
    async fn test_recovers_on_later_attempt() {
        let mut source = mock_source();
        let mut seq = mockall::Sequence::new();
        source
            .expect_fetch_details()
            .times(2)
            .in_sequence(&mut seq)
            .returning(|_, _| Err(AppError::ExternalApi("status 503".to_string())));
        source
            .expect_fetch_details()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(details(Some("/late.jpg"))));

        let url = resolver(source, Some("secret")).resolve(MovieId(1)).await;
        assert_eq!(url, "https://image.tmdb.org/t/p/w500/late.jpg");
    }

    #[tokio::test]
    async fn test_malformed_body_is_not_retried() {
        let mut source = mock_source();
        source
            .expect_fetch_details()
            .times(1)
            .returning(|_, _| Err(AppError::Decode("expected value".to_string())));

        let url = resolver(source, Some("secret")).resolve(MovieId(1)).await;
        assert_eq!(url, PLACEHOLDER);
    }

    #[tokio::test]
    async fn test_resolve_many_preserves_order() {
        let mut source = mock_source();
        source
            .expect_fetch_details()
            .times(3)
            .returning(|id, _| match id.0 {
                2 => Ok(details(None)),
                n => Ok(details(Some(&format!("/{}.jpg", n)))),
            });

        let urls = resolver(source, Some("secret"))
            .resolve_many(vec![MovieId(1), MovieId(2), MovieId(3)], None)
            .await;

        assert_eq!(
            urls,
            vec![
                "https://image.tmdb.org/t/p/w500/1.jpg".to_string(),
                PLACEHOLDER.to_string(),
                "https://image.tmdb.org/t/p/w500/3.jpg".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_resolve_many_deadline_degrades_to_placeholder() {
        let mut source = mock_source();
        source
            .expect_fetch_details()
            .times(3)
            .returning(|_, _| Err(AppError::ExternalApi("connection refused".to_string())));

        let slow = PosterResolver::new(
            Arc::new(source),
            Some("secret".to_string()),
            IMAGE_BASE.to_string(),
            PLACEHOLDER.to_string(),
            RetryPolicy {
                max_attempts: 3,
                delay: Duration::from_secs(30),
            },
        );

        let urls = slow
            .resolve_many(
                vec![MovieId(1), MovieId(2), MovieId(3)],
                Some(Duration::from_millis(50)),
            )
            .await;

        assert_eq!(urls, vec![PLACEHOLDER.to_string(); 3]);
    }

    #[test]
    fn test_poster_url_without_leading_slash() {
        let resolver = resolver(mock_source(), Some("secret"));
        assert_eq!(
            resolver.poster_url("x.jpg"),
            "https://image.tmdb.org/t/p/w500/x.jpg"
        );
    }
}
