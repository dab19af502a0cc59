//! epd-export library
//!
//! Converts fonts and images to C source the epdiy driver compiles in.

pub mod codegen;
pub mod error;
pub mod font;
pub mod image;
pub mod manifest;

use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;

pub use error::ExportError;

// Re-export shared data model and packing from epd-common
pub use epd_common::{
    CodePointInterval, FontMetrics, FontTable, GlyphRecord, NibbleOrder, PackedImage,
};

// Re-export key types for font conversion
pub use font::{
    FontRequest, IntervalGlyphPacker, PackedFont, Selection, Validation, convert_font,
    convert_font_to_memory,
};

// Re-export image conversion types
pub use crate::image::{ImageOptions, convert_image, convert_image_to_memory};

/// Write generated source to a file, or to stdout when no path is given
pub fn write_output(output: Option<&Path>, text: &str) -> Result<()> {
    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create directory: {:?}", parent))?;
            }
            let file = std::fs::File::create(path)
                .with_context(|| format!("Failed to create output: {:?}", path))?;
            let mut writer = std::io::BufWriter::new(file);
            writer.write_all(text.as_bytes())?;
            writer
                .flush()
                .with_context(|| format!("Failed to write output: {:?}", path))?;
        }
        None => {
            let stdout = std::io::stdout();
            let mut lock = stdout.lock();
            lock.write_all(text.as_bytes())?;
            lock.flush()?;
        }
    }
    Ok(())
}
