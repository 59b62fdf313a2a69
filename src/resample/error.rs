use thiserror::Error;

use crate::table::TableError;

#[derive(Debug, Error)]
pub enum ResampleError {
    #[error("resampling needs at least 2 samples, got {0}")]
    TooFewSamples(usize),
    #[error("resampling period must be positive, got {0}")]
    InvalidPeriod(chrono::Duration),
    #[error("interpolation failed: {0}")]
    Interpolation(String),
    #[error("table error: {0}")]
    Table(#[from] TableError),
}
