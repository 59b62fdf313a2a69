use thiserror::Error;

use crate::filter::FilterError;
use crate::resample::ResampleError;
use crate::table::TableError;

#[derive(Debug, Error)]
pub enum FlightError {
    #[error("table error: {0}")]
    Table(#[from] TableError),
    #[error("filter error: {0}")]
    Filter(#[from] FilterError),
    #[error("resample error: {0}")]
    Resample(#[from] ResampleError),
}
