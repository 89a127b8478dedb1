//! Error type of the inspection tool.

use cloudslicer_core::CloudError;
use thiserror::Error;

/// Errors surfaced by scene loading and `slice_inspect`.
#[derive(Debug, Error)]
pub enum AppError {
    /// Voxelizing, slicing or the pack file failed.
    #[error(transparent)]
    Cloud(#[from] CloudError),

    /// Reading the scene file failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// The scene file is not valid TOML or has the wrong shape.
    #[error("invalid scene file: {0}")]
    Toml(#[from] toml::de::Error),

    /// The scene parsed but describes something impossible.
    #[error("invalid scene: {0}")]
    InvalidScene(String),

    /// Bad command line.
    #[error("{0}")]
    Usage(String),
}

/// Result type for the inspection tool.
pub type AppResult<T> = Result<T, AppError>;
