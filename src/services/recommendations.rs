use crate::{
    error::{AppError, AppResult},
    models::{Movie, Recommendation},
    services::posters::PosterResolver,
    store::SimilarityStore,
};
use std::time::Duration;

/// Finds the `k` movies most similar to `title`
///
/// Peers are ordered by score descending; equal scores keep catalog order, so the
/// result is deterministic for a given row. The query movie is excluded by its
/// index rather than by rank, so a peer scoring as high as the query itself is
/// still recommended.
pub fn similar_movies(store: &SimilarityStore, title: &str, k: usize) -> AppResult<Vec<Movie>> {
    let index = store.index_of(title)?;

    let mut peers: Vec<(usize, f64)> = store
        .row(index)?
        .filter(|(peer, _)| *peer != index)
        .collect();
    // sort_by is stable: ties stay in catalog order
    peers.sort_by(|a, b| b.1.total_cmp(&a.1));

    peers
        .into_iter()
        .take(k)
        .map(|(peer, _)| {
            store
                .movie(peer)
                .cloned()
                .ok_or_else(|| AppError::Internal(format!("catalog index {} out of range", peer)))
        })
        .collect()
}

/// Recommends `k` movies similar to `title`, each with a display poster
///
/// Only an unknown title fails; poster problems degrade to the placeholder image.
pub async fn recommend(
    store: &SimilarityStore,
    posters: &PosterResolver,
    title: &str,
    k: usize,
    deadline: Option<Duration>,
) -> AppResult<Vec<Recommendation>> {
    let movies = similar_movies(store, title, k)?;

    tracing::info!(
        title = %title,
        k,
        found = movies.len(),
        "Ranked similar movies"
    );

    let poster_urls = posters
        .resolve_many(movies.iter().map(|m| m.id).collect(), deadline)
        .await;

    Ok(movies
        .into_iter()
        .zip(poster_urls)
        .map(|(movie, poster_url)| Recommendation {
            movie_id: movie.id,
            title: movie.title,
            poster_url,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::posters::{MockMovieDetailsSource, RetryPolicy};
    use std::sync::Arc;

    const PLACEHOLDER: &str = "https://via.placeholder.com/300x450?text=No+Poster";

    fn titles(movies: &[Movie]) -> Vec<&str> {
        movies.iter().map(|m| m.title.as_str()).collect()
    }

    fn abc_store() -> SimilarityStore {
        SimilarityStore::from_parts(
            vec![Movie::new(1, "A"), Movie::new(2, "B"), Movie::new(3, "C")],
            vec![
                vec![1.0, 0.9, 0.2],
                vec![0.9, 1.0, 0.4],
                vec![0.2, 0.4, 1.0],
            ],
        )
        .unwrap()
    }

    fn catalog_of(n: usize) -> SimilarityStore {
        let movies = (0..n)
            .map(|i| Movie::new(i as u64 + 100, format!("Movie {}", i)))
            .collect();
        let matrix = (0..n)
            .map(|i| {
                (0..n)
                    .map(|j| if i == j { 1.0 } else { 1.0 / (1.0 + i.abs_diff(j) as f64) })
                    .collect()
            })
            .collect();
        SimilarityStore::from_parts(movies, matrix).unwrap()
    }

    fn placeholder_resolver() -> PosterResolver {
        let mut source = MockMovieDetailsSource::new();
        source.expect_name().return_const("mock");
        source.expect_fetch_details().times(0);
        PosterResolver::new(
            Arc::new(source),
            None,
            "https://image.tmdb.org/t/p".to_string(),
            PLACEHOLDER.to_string(),
            RetryPolicy::default(),
        )
    }

    #[test]
    fn test_scenario_a_recommends_b_then_c() {
        let movies = similar_movies(&abc_store(), "A", 2).unwrap();
        assert_eq!(titles(&movies), vec!["B", "C"]);
    }

    #[test]
    fn test_returns_exactly_k_and_never_the_query() {
        let store = catalog_of(12);
        for movie in store.movies() {
            let result = similar_movies(&store, &movie.title, 5).unwrap();
            assert_eq!(result.len(), 5);
            assert!(result.iter().all(|m| m.id != movie.id));
        }
    }

    #[test]
    fn test_ties_break_by_catalog_order() {
        let store = SimilarityStore::from_parts(
            vec![
                Movie::new(1, "Q"),
                Movie::new(2, "W"),
                Movie::new(3, "X"),
                Movie::new(4, "Y"),
                Movie::new(5, "Z"),
            ],
            vec![
                vec![1.0, 0.5, 0.7, 0.5, 0.7],
                vec![0.5, 1.0, 0.0, 0.0, 0.0],
                vec![0.7, 0.0, 1.0, 0.0, 0.0],
                vec![0.5, 0.0, 0.0, 1.0, 0.0],
                vec![0.7, 0.0, 0.0, 0.0, 1.0],
            ],
        )
        .unwrap();

        let first = similar_movies(&store, "Q", 4).unwrap();
        assert_eq!(titles(&first), vec!["X", "Z", "W", "Y"]);

        let again = similar_movies(&store, "Q", 4).unwrap();
        assert_eq!(first, again);
    }

    #[test]
    fn test_query_excluded_by_identity_not_rank() {
        // "B" is less similar to itself than "C" is to it.
        let store = SimilarityStore::from_parts(
            vec![Movie::new(1, "A"), Movie::new(2, "B"), Movie::new(3, "C")],
            vec![
                vec![1.0, 0.9, 0.2],
                vec![0.9, 0.3, 0.95],
                vec![0.2, 0.95, 1.0],
            ],
        )
        .unwrap();

        let movies = similar_movies(&store, "B", 2).unwrap();
        assert_eq!(titles(&movies), vec!["C", "A"]);
    }

    #[test]
    fn test_scores_closer_than_f32_precision_rank_distinctly() {
        // 0.3 and 0.3 + 1e-12 collapse to the same f32.
        let store = SimilarityStore::from_parts(
            vec![Movie::new(1, "A"), Movie::new(2, "B"), Movie::new(3, "C")],
            vec![
                vec![1.0, 0.3, 0.3 + 1e-12],
                vec![0.3, 1.0, 0.1],
                vec![0.3 + 1e-12, 0.1, 1.0],
            ],
        )
        .unwrap();

        let movies = similar_movies(&store, "A", 2).unwrap();
        assert_eq!(titles(&movies), vec!["C", "B"]);
    }

    #[test]
    fn test_small_catalog_returns_all_peers() {
        let movies = similar_movies(&abc_store(), "C", 5).unwrap();
        assert_eq!(titles(&movies), vec!["B", "A"]);
    }

    #[test]
    fn test_unknown_title_is_not_found() {
        let result = similar_movies(&abc_store(), "Unknown", 5);
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_recommend_attaches_posters_in_rank_order() {
        let recs = recommend(&abc_store(), &placeholder_resolver(), "A", 2, None)
            .await
            .unwrap();

        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].title, "B");
        assert_eq!(recs[0].movie_id.0, 2);
        assert_eq!(recs[1].title, "C");
        assert!(recs.iter().all(|r| r.poster_url == PLACEHOLDER));
    }

    #[tokio::test]
    async fn test_recommend_unknown_title_returns_no_partial_results() {
        let result = recommend(&abc_store(), &placeholder_resolver(), "Nope", 5, None).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
