use crate::{
    error::{AppError, AppResult},
    models::{CatalogStats, Movie},
    store::loader,
};
use chrono::{DateTime, Utc};
use std::{collections::HashMap, path::Path};

/// Immutable catalog plus its square similarity matrix.
///
/// Built once at startup and shared read-only (behind an `Arc`) by every request.
/// Row `i` of the matrix holds the similarity of `movies[i]` to every movie in the catalog.
#[derive(Debug)]
pub struct SimilarityStore {
    movies: Vec<Movie>,
    matrix: Vec<Vec<f64>>,
    /// Title -> first catalog index carrying that title
    title_index: HashMap<String, usize>,
    loaded_at: DateTime<Utc>,
}

impl SimilarityStore {
    /// Loads the catalog and similarity matrix from disk
    ///
    /// Any failure here is fatal to startup.
    pub fn load(catalog_path: &Path, similarity_path: &Path) -> AppResult<Self> {
        let movies = loader::read_catalog(catalog_path)?;
        let matrix = loader::read_similarity(similarity_path)?;
        let store = Self::from_parts(movies, matrix)?;

        tracing::info!(
            movies = store.len(),
            catalog = %catalog_path.display(),
            similarity = %similarity_path.display(),
            "Loaded catalog and similarity matrix"
        );

        Ok(store)
    }

    /// Builds a store from already decoded parts, validating their shape
    pub fn from_parts(movies: Vec<Movie>, matrix: Vec<Vec<f64>>) -> AppResult<Self> {
        if movies.is_empty() {
            return Err(AppError::Load("catalog is empty".to_string()));
        }

        if matrix.len() != movies.len() {
            return Err(AppError::Load(format!(
                "similarity matrix has {} rows but catalog has {} movies",
                matrix.len(),
                movies.len()
            )));
        }

        for (i, row) in matrix.iter().enumerate() {
            if row.len() != movies.len() {
                return Err(AppError::Load(format!(
                    "similarity row {} has {} columns, expected {}",
                    i,
                    row.len(),
                    movies.len()
                )));
            }
            if let Some(j) = row.iter().position(|score| !score.is_finite()) {
                return Err(AppError::Load(format!(
                    "similarity score at ({}, {}) is not finite",
                    i, j
                )));
            }
        }

        let mut title_index = HashMap::with_capacity(movies.len());
        for (i, movie) in movies.iter().enumerate() {
            if title_index.contains_key(&movie.title) {
                tracing::warn!(
                    title = %movie.title,
                    index = i,
                    "Duplicate title in catalog; lookups resolve to the first occurrence"
                );
                continue;
            }
            title_index.insert(movie.title.clone(), i);
        }

        Ok(Self {
            movies,
            matrix,
            title_index,
            loaded_at: Utc::now(),
        })
    }

    /// Exact-match lookup of a title's catalog index
    pub fn index_of(&self, title: &str) -> AppResult<usize> {
        self.title_index
            .get(title)
            .copied()
            .ok_or_else(|| AppError::NotFound(title.to_string()))
    }

    /// The similarity row of `index`, paired with peer indices
    pub fn row(&self, index: usize) -> AppResult<impl Iterator<Item = (usize, f64)> + '_> {
        let row = self.matrix.get(index).ok_or_else(|| {
            AppError::Internal(format!("catalog index {} out of range", index))
        })?;
        Ok(row.iter().copied().enumerate())
    }

    pub fn movie(&self, index: usize) -> Option<&Movie> {
        self.movies.get(index)
    }

    pub fn movies(&self) -> &[Movie] {
        &self.movies
    }

    pub fn len(&self) -> usize {
        self.movies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movies.is_empty()
    }

    pub fn stats(&self) -> CatalogStats {
        CatalogStats {
            movie_count: self.movies.len(),
            matrix_dimension: self.matrix.len(),
            loaded_at: self.loaded_at,
        }
    }
}
