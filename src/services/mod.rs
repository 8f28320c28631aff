pub mod posters;
pub mod recommendations;

pub use posters::{MovieDetailsSource, PosterResolver, RetryPolicy, TmdbClient};
