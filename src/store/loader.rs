//! Readers for the precomputed resources produced offline.
//!
//! - Catalog: JSON in matrix row order, either an array of `{"movie_id", "title"}`
//!   records or the column layout pandas writes by default,
//!   `{"movie_id": {"0": .., ..}, "title": {"0": .., ..}}`.
//! - Similarity matrix: gzip-compressed bincode `Vec<Vec<f64>>`, row-major.
use crate::{
    error::{AppError, AppResult},
    models::{Movie, MovieId},
};
use flate2::read::GzDecoder;
use serde::Deserialize;
use std::{collections::BTreeMap, fs::File, io::BufReader, path::Path};

/// Column-oriented catalog, each column keyed by row index.
///
/// Keys stay strings here: integer map keys do not survive serde's buffering of
/// untagged enums, so they are parsed after the layout is known.
#[derive(Debug, Deserialize)]
struct CatalogColumns {
    movie_id: BTreeMap<String, MovieId>,
    title: BTreeMap<String, String>,
}

fn by_row<T>(column: &str, cells: BTreeMap<String, T>) -> Result<BTreeMap<usize, T>, String> {
    cells
        .into_iter()
        .map(|(key, value)| {
            key.parse::<usize>()
                .map(|row| (row, value))
                .map_err(|_| format!("{} column has non-numeric row key {:?}", column, key))
        })
        .collect()
}

impl CatalogColumns {
    /// Zips the columns into rows; both must cover exactly the rows `0..N`
    fn into_movies(self) -> Result<Vec<Movie>, String> {
        let ids = by_row("movie_id", self.movie_id)?;
        let titles = by_row("title", self.title)?;

        if !ids.keys().eq(titles.keys()) {
            return Err("movie_id and title columns have different row keys".to_string());
        }
        if !ids.keys().copied().eq(0..ids.len()) {
            return Err("row keys are not contiguous from 0".to_string());
        }

        Ok(ids
            .into_values()
            .zip(titles.into_values())
            .map(|(id, title)| Movie { id, title })
            .collect())
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CatalogLayout {
    Records(Vec<Movie>),
    Columns(CatalogColumns),
}

fn open(path: &Path) -> AppResult<BufReader<File>> {
    let file = File::open(path)
        .map_err(|e| AppError::Load(format!("cannot open {}: {}", path.display(), e)))?;
    Ok(BufReader::new(file))
}

/// Reads the catalog table
pub fn read_catalog(path: &Path) -> AppResult<Vec<Movie>> {
    let reader = open(path)?;
    let layout: CatalogLayout = serde_json::from_reader(reader)
        .map_err(|e| AppError::Load(format!("invalid catalog {}: {}", path.display(), e)))?;

    match layout {
        CatalogLayout::Records(movies) => Ok(movies),
        CatalogLayout::Columns(columns) => columns
            .into_movies()
            .map_err(|e| AppError::Load(format!("invalid catalog {}: {}", path.display(), e))),
    }
}

/// Reads and decompresses the similarity matrix
pub fn read_similarity(path: &Path) -> AppResult<Vec<Vec<f64>>> {
    let reader = open(path)?;
    bincode::deserialize_from(GzDecoder::new(reader)).map_err(|e| {
        AppError::Load(format!(
            "invalid similarity matrix {}: {}",
            path.display(),
            e
        ))
    })
}
