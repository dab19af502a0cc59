//! In-memory asset formats
//!
//! These hold converted assets between conversion and C-source emission.
//! Nothing here is persisted in binary form.

pub mod font;
pub mod image;

pub use font::*;
pub use image::*;
