//! Font converter (TTF/OTF -> EpdFont C source)
//!
//! Loads a stack of font files, packs the selected glyphs and emits the
//! `EpdFont` tables the display driver renders text from.

pub mod packer;
pub mod selection;
pub mod source;

pub use packer::{IntervalGlyphPacker, MetricsAccumulator, PackedFont};
pub use selection::{DEFAULT_INTERVALS, Selection, SelectionMode, Validation};
pub use source::{FaceMetrics, FontFileSource, FontStack, GlyphSource, RasterGlyph};

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::codegen::{generate_font_source, validate_identifier};
use crate::error::ExportError;

/// Everything needed to convert one font
#[derive(Debug, Clone)]
pub struct FontRequest {
    /// C identifier of the generated font
    pub name: String,
    /// Point size, rendered at the display's dpi
    pub size: u32,
    /// Font files ordered by descending priority
    pub sources: Vec<PathBuf>,
    /// zlib-compress glyph bitmaps
    pub compress: bool,
    pub selection: Selection,
}

/// Convert a font to an in-memory table
///
/// The font files stay open for the duration of the pass only.
pub fn convert_font_to_memory(request: &FontRequest) -> Result<PackedFont, ExportError> {
    validate_identifier(&request.name)?;
    if request.size == 0 {
        return Err(ExportError::invalid("font size must be at least 1"));
    }
    if request.sources.is_empty() {
        return Err(ExportError::invalid("at least one font file is required"));
    }

    let stack = FontStack::load(&request.sources, request.size)?;
    let packed = IntervalGlyphPacker::new(&stack, request.compress).pack(&request.selection)?;

    tracing::info!(
        "Font {:?} as '{}' using {} characters",
        request.sources[0],
        request.name,
        packed.table.glyph_count()
    );
    if packed.fallback_count > 0 {
        tracing::info!("{} glyphs taken from fallback fonts", packed.fallback_count);
    }
    if !packed.missing.is_empty() {
        tracing::warn!("{} requested code points are missing", packed.missing.len());
    }
    tracing::info!("total {}", packed.packed_size);
    tracing::info!("compressed {}", packed.table.bitmap().len());
    tracing::info!("Included intervals");
    for interval in packed.table.intervals() {
        tracing::info!("    ( {}, {})", interval.low, interval.high);
    }

    Ok(packed)
}

/// Convert a font and write its C source to `output` (stdout when `None`)
pub fn convert_font(request: &FontRequest, output: Option<&Path>, command_line: &str) -> Result<()> {
    let packed = convert_font_to_memory(request)
        .with_context(|| format!("Failed to convert font '{}'", request.name))?;
    let source = generate_font_source(&request.name, &packed.table, command_line)?;
    crate::write_output(output, &source)
}
