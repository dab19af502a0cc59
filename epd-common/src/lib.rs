//! Shared types and utilities for epdiy asset conversion
//!
//! This crate provides the pieces shared between:
//! - `epd-export` (font and image converters)
//! - `epd-cli` (display HTTP client)
//!
//! # Modules
//!
//! - [`packing`] - 4-bit grayscale quantization and nibble packing
//! - [`intervals`] - Unicode code point intervals and coalescing
//! - [`formats`] - In-memory font table and packed image formats

pub mod formats;
pub mod intervals;
pub mod packing;

// Re-export commonly used packing items
pub use packing::{
    GRAY_LEVELS, NibbleOrder, expand_gray4, pack_gray4, pack_levels, packed_row_len,
    quantize_gray4, unpack_gray4, unpack_levels,
};

// Re-export interval types
pub use intervals::{CodePointInterval, IntervalError, coalesce, from_code_points, is_coalesced};

// Re-export commonly used format items
pub use formats::{FontMetrics, FontTable, GlyphRecord, PackedImage};
