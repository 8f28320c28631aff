use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::error::AppResult;
use crate::services::{PosterResolver, RetryPolicy, TmdbClient};
use crate::store::SimilarityStore;

/// Limits applied to recommendation requests
#[derive(Debug, Clone, Copy)]
pub struct RecommendationSettings {
    pub default_count: usize,
    pub max_count: usize,
    /// Overall poster deadline per request
    pub deadline: Option<Duration>,
}

impl Default for RecommendationSettings {
    fn default() -> Self {
        Self {
            default_count: 5,
            max_count: 20,
            deadline: None,
        }
    }
}

/// Shared application state
///
/// The store is read-only after startup, so it is shared without a lock.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<SimilarityStore>,
    pub posters: PosterResolver,
    pub settings: RecommendationSettings,
}

impl AppState {
    pub fn new(
        store: Arc<SimilarityStore>,
        posters: PosterResolver,
        settings: RecommendationSettings,
    ) -> Self {
        Self {
            store,
            posters,
            settings,
        }
    }

    /// Loads the catalog and similarity matrix and wires up poster resolution
    ///
    /// Called once at startup; a load failure aborts the process.
    pub fn init(config: &Config) -> AppResult<Self> {
        let store = SimilarityStore::load(&config.catalog_path, &config.similarity_path)?;

        let api_key = config.api_key().map(str::to_string);
        if api_key.is_none() {
            tracing::warn!("TMDB_API_KEY not set, all posters will use the placeholder image");
        }

        let client = TmdbClient::new(config.tmdb_api_url.clone(), config.poster_timeout())?;
        let posters = PosterResolver::new(
            Arc::new(client),
            api_key,
            config.tmdb_image_url.clone(),
            config.placeholder_poster_url.clone(),
            RetryPolicy {
                max_attempts: config.poster_max_attempts,
                delay: config.poster_retry_delay(),
            },
        );

        let settings = RecommendationSettings {
            default_count: config.default_recommendations,
            max_count: config.max_recommendations,
            deadline: config.recommendation_deadline(),
        };

        Ok(Self::new(Arc::new(store), posters, settings))
    }
}
