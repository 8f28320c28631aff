pub mod loader;
pub mod similarity;

pub use similarity::SimilarityStore;
