//! Font sources and the fallback stack
//!
//! A [`GlyphSource`] answers whether it has a glyph for a code point and
//! rasterizes it at the size fixed when the source was created. The
//! [`FontStack`] tries its sources in priority order and the first hit wins.

use fontdue::{Font, FontSettings};
use std::path::{Path, PathBuf};

use crate::error::ExportError;

/// The display has about 150 dpi
pub const DISPLAY_DPI: f32 = 150.0;

const POINTS_PER_INCH: f32 = 72.0;

/// Fixed-point scale of metrics (26.6, 64ths of a pixel)
pub const FIXED_POINT_ONE: i32 = 64;

/// Pixel size of a font rendered at `point_size` on the display
pub fn pixel_size(point_size: u32) -> f32 {
    point_size as f32 * DISPLAY_DPI / POINTS_PER_INCH
}

/// Convert pixels to 26.6 fixed point
#[inline]
pub fn to_fixed(pixels: f32) -> i32 {
    (pixels * FIXED_POINT_ONE as f32).round() as i32
}

/// Face-level vertical metrics in 26.6 fixed point
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FaceMetrics {
    pub ascender: i32,
    pub descender: i32,
    pub height: i32,
}

/// A rasterized glyph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterGlyph {
    pub width: u16,
    pub height: u16,
    /// Row-major 8-bit coverage, `width * height` samples
    pub bitmap: Vec<u8>,
    /// Horizontal advance in 26.6 fixed point
    pub advance_x: i32,
    pub left: i16,
    pub top: i16,
}

/// Something that can turn code points into glyph bitmaps
pub trait GlyphSource {
    /// Human readable name for diagnostics (usually the file name)
    fn name(&self) -> &str;

    /// Glyph index for a code point, 0 when the source has no glyph
    fn glyph_index(&self, code_point: u32) -> u16;

    fn has_glyph(&self, code_point: u32) -> bool {
        self.glyph_index(code_point) != 0
    }

    /// Rasterize the glyph for a code point, `None` when absent
    fn rasterize(&self, code_point: u32) -> Option<RasterGlyph>;

    /// Vertical metrics of the face at the configured size
    fn face_metrics(&self) -> FaceMetrics;
}

// ============================================================================
// TrueType / OpenType files
// ============================================================================

/// A TrueType/OpenType font rasterized with fontdue
pub struct FontFileSource {
    name: String,
    font: Font,
    px: f32,
}

impl FontFileSource {
    /// Load a font file for rendering at `point_size`
    pub fn load(path: &Path, point_size: u32) -> Result<Self, ExportError> {
        let data = std::fs::read(path).map_err(|e| ExportError::FontLoad {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Self::from_bytes(name, &data, point_size).map_err(|e| match e {
            ExportError::FontLoad { reason, .. } => ExportError::FontLoad {
                path: path.to_path_buf(),
                reason,
            },
            other => other,
        })
    }

    /// Parse a font from memory
    pub fn from_bytes(
        name: impl Into<String>,
        data: &[u8],
        point_size: u32,
    ) -> Result<Self, ExportError> {
        let name = name.into();
        if point_size == 0 {
            return Err(ExportError::invalid("font size must be at least 1"));
        }

        let px = pixel_size(point_size);
        let settings = FontSettings {
            scale: px,
            ..FontSettings::default()
        };
        let font = Font::from_bytes(data, settings).map_err(|reason| ExportError::FontLoad {
            path: PathBuf::from(&name),
            reason: reason.to_string(),
        })?;

        Ok(Self { name, font, px })
    }
}

impl GlyphSource for FontFileSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn glyph_index(&self, code_point: u32) -> u16 {
        char::from_u32(code_point).map_or(0, |c| self.font.lookup_glyph_index(c))
    }

    fn rasterize(&self, code_point: u32) -> Option<RasterGlyph> {
        let index = self.glyph_index(code_point);
        if index == 0 {
            return None;
        }

        let (metrics, bitmap) = self.font.rasterize_indexed(index, self.px);
        let top = metrics.ymin + metrics.height as i32;

        Some(RasterGlyph {
            width: clamp_u16(metrics.width),
            height: clamp_u16(metrics.height),
            bitmap,
            advance_x: to_fixed(metrics.advance_width),
            left: clamp_i16(metrics.xmin),
            top: clamp_i16(top),
        })
    }

    fn face_metrics(&self) -> FaceMetrics {
        match self.font.horizontal_line_metrics(self.px) {
            Some(line) => FaceMetrics {
                ascender: to_fixed(line.ascent),
                descender: to_fixed(line.descent),
                height: to_fixed(line.new_line_size),
            },
            None => {
                tracing::warn!("{} has no horizontal line metrics", self.name);
                FaceMetrics::default()
            }
        }
    }
}

fn clamp_u16(value: usize) -> u16 {
    u16::try_from(value).unwrap_or(u16::MAX)
}

fn clamp_i16(value: i32) -> i16 {
    value.clamp(i16::MIN as i32, i16::MAX as i32) as i16
}

// ============================================================================
// Fallback stack
// ============================================================================

/// A glyph together with the source that produced it
#[derive(Debug, Clone)]
pub struct ResolvedGlyph {
    /// Position of the resolving source in the stack (0 = primary)
    pub source_index: usize,
    pub glyph: RasterGlyph,
    pub face: FaceMetrics,
}

/// Font sources ordered by descending priority
///
/// Sources are held for the whole conversion and dropped with the stack.
pub struct FontStack {
    sources: Vec<Box<dyn GlyphSource>>,
}

impl FontStack {
    pub fn new(sources: Vec<Box<dyn GlyphSource>>) -> Result<Self, ExportError> {
        if sources.is_empty() {
            return Err(ExportError::invalid("font stack needs at least one font"));
        }
        Ok(Self { sources })
    }

    /// Load every font file at the same point size
    pub fn load(paths: &[PathBuf], point_size: u32) -> Result<Self, ExportError> {
        let sources = paths
            .iter()
            .map(|path| {
                FontFileSource::load(path, point_size)
                    .map(|source| Box::new(source) as Box<dyn GlyphSource>)
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(sources)
    }

    pub fn primary(&self) -> &dyn GlyphSource {
        self.sources[0].as_ref()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn sources(&self) -> impl Iterator<Item = &dyn GlyphSource> {
        self.sources.iter().map(|s| s.as_ref())
    }

    /// Whether any source in the stack has the code point
    pub fn contains(&self, code_point: u32) -> bool {
        self.sources().any(|s| s.has_glyph(code_point))
    }

    /// Rasterize a code point with the first source that has it
    ///
    /// Logs a diagnostic whenever a lower priority source had to be used.
    pub fn resolve(&self, code_point: u32) -> Option<ResolvedGlyph> {
        for (source_index, source) in self.sources().enumerate() {
            let Some(glyph) = source.rasterize(code_point) else {
                continue;
            };

            if source_index > 0 {
                tracing::warn!(
                    "{} not in {}, falling back to font {} ({})",
                    describe(code_point),
                    self.primary().name(),
                    source_index,
                    source.name()
                );
            }

            return Some(ResolvedGlyph {
                source_index,
                glyph,
                face: source.face_metrics(),
            });
        }
        None
    }
}

/// `U+0041 'A'` style label for diagnostics
pub fn describe(code_point: u32) -> String {
    match char::from_u32(code_point) {
        Some(c) if !c.is_control() => format!("U+{:04X} '{}'", code_point, c),
        _ => format!("U+{:04X}", code_point),
    }
}
