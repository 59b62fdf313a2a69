use thiserror::Error;

use crate::table::TableError;

#[derive(Debug, Error)]
pub enum FilterError {
    #[error("table error: {0}")]
    Table(#[from] TableError),
    #[error("kernel size for {feature} must be odd and positive, got {kernel}")]
    InvalidKernel { feature: String, kernel: usize },
    #[error("kernel size {kernel} for {feature} exceeds the {available} available samples")]
    KernelTooLarge {
        feature: String,
        kernel: usize,
        available: usize,
    },
    #[error("{features} features given with {kernels} kernel sizes")]
    KernelCountMismatch { features: usize, kernels: usize },
}
