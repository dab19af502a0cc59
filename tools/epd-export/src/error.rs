//! Conversion errors

use epd_common::IntervalError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    /// Code point absent from every font source. Recoverable: the packer logs
    /// it and moves on.
    #[error("code point U+{code_point:04X} not found in font stack")]
    MissingGlyph { code_point: u32 },

    #[error("no requested code point could be resolved, font table is empty")]
    EmptyFontTable,

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("failed to load font {path:?}: {reason}")]
    FontLoad { path: PathBuf, reason: String },

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<IntervalError> for ExportError {
    fn from(err: IntervalError) -> Self {
        ExportError::InvalidArgument(err.to_string())
    }
}

impl ExportError {
    pub fn invalid(message: impl Into<String>) -> Self {
        ExportError::InvalidArgument(message.into())
    }
}
