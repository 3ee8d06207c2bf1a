//! Error type for PDF inversion runs.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, InvertError>;

/// Everything that can abort an inversion run.
///
/// Every variant is terminal: the run stops at the first error and no
/// output file is written.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InvertError {
    /// The requested rasterization resolution is not usable.
    #[error("DPI must be a positive number, got {0}")]
    InvalidDpi(f32),

    /// The input could not be read or is not a valid PDF.
    #[error("Failed to open PDF: {0}")]
    DocumentOpen(String),

    /// A page could not be rendered. `page` is 1-based.
    #[error("Failed to rasterize page {page}: {message}")]
    Rasterization { page: usize, message: String },

    /// A pixel buffer or embedded image could not be built.
    #[error("Image error: {0}")]
    Image(String),

    /// The output document could not be written.
    #[error("Failed to save PDF: {0}")]
    Save(String),
}
