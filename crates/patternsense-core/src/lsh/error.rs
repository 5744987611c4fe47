//! LSH configuration errors.

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LshError {
    #[error("num_hashes must be greater than zero")]
    ZeroHashes,

    #[error("num_bands must be greater than zero")]
    ZeroBands,

    #[error("num_bands ({num_bands}) must divide num_hashes ({num_hashes})")]
    BandsDoNotDivide { num_hashes: usize, num_bands: usize },

    #[error("shingle_size must be greater than zero")]
    ZeroShingle,
}
