//! Packed font table
//!
//! A font is a single byte buffer holding every glyph bitmap back to back, a
//! glyph array sorted by code point and an interval list mapping code points to
//! glyph indices. This mirrors the driver's `EpdFont`/`EpdGlyph`/`EpdUnicodeInterval`
//! layout.

use crate::intervals::{CodePointInterval, from_code_points};

/// Metrics and bitmap location for one glyph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlyphRecord {
    /// Unicode code point (not emitted to C, the interval table implies it)
    pub code_point: u32,

    /// Bitmap width in pixels
    pub width: u16,

    /// Bitmap height in pixels
    pub height: u16,

    /// Distance to advance the cursor (x axis)
    pub advance_x: i32,

    /// X distance from cursor position to the bitmap's left edge
    pub bearing_left: i16,

    /// Y distance from the baseline up to the bitmap's top edge
    pub bearing_top: i16,

    /// Size of the (possibly compressed) bitmap in bytes
    pub payload_size: u32,

    /// Offset of the bitmap into the shared glyph buffer
    pub payload_offset: u32,
}

impl GlyphRecord {
    /// One past the last byte of this glyph's payload
    pub fn payload_end(&self) -> u32 {
        self.payload_offset + self.payload_size
    }
}

/// Normalized vertical metrics of the whole font, in pixels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FontMetrics {
    /// Newline distance (y axis)
    pub advance_y: i32,
    /// Maximal height of a glyph above the base line
    pub ascender: i32,
    /// Maximal height of a glyph below the base line (usually negative)
    pub descender: i32,
}

/// A complete, immutable font ready for emission
#[derive(Debug, Clone)]
pub struct FontTable {
    glyphs: Vec<GlyphRecord>,
    intervals: Vec<CodePointInterval>,
    interval_offsets: Vec<u32>,
    bitmap: Vec<u8>,
    compressed: bool,
    metrics: FontMetrics,
}

impl FontTable {
    /// Assemble a table from glyphs sorted by ascending, unique code point
    ///
    /// The interval list is derived from the glyphs themselves, so it always
    /// covers exactly the populated code points.
    pub fn new(
        glyphs: Vec<GlyphRecord>,
        bitmap: Vec<u8>,
        compressed: bool,
        metrics: FontMetrics,
    ) -> Self {
        debug_assert!(
            glyphs.windows(2).all(|w| w[0].code_point < w[1].code_point),
            "glyphs must be sorted by unique code point"
        );

        let intervals = from_code_points(glyphs.iter().map(|g| g.code_point));
        let interval_offsets = intervals
            .iter()
            .scan(0u32, |offset, interval| {
                let start = *offset;
                *offset += interval.len();
                Some(start)
            })
            .collect();

        Self {
            glyphs,
            intervals,
            interval_offsets,
            bitmap,
            compressed,
            metrics,
        }
    }

    pub fn glyphs(&self) -> &[GlyphRecord] {
        &self.glyphs
    }

    pub fn intervals(&self) -> &[CodePointInterval] {
        &self.intervals
    }

    /// Index of each interval's first glyph in the glyph array
    pub fn interval_offsets(&self) -> &[u32] {
        &self.interval_offsets
    }

    /// Intervals paired with their glyph index offsets
    pub fn interval_entries(&self) -> impl Iterator<Item = (CodePointInterval, u32)> + '_ {
        self.intervals
            .iter()
            .copied()
            .zip(self.interval_offsets.iter().copied())
    }

    /// All glyph bitmaps, concatenated
    pub fn bitmap(&self) -> &[u8] {
        &self.bitmap
    }

    pub fn is_compressed(&self) -> bool {
        self.compressed
    }

    pub fn metrics(&self) -> FontMetrics {
        self.metrics
    }

    pub fn glyph_count(&self) -> usize {
        self.glyphs.len()
    }

    /// Find a glyph the way the driver does: interval search, then offset
    pub fn find_glyph(&self, code_point: u32) -> Option<&GlyphRecord> {
        let idx = self.intervals.partition_point(|i| i.high < code_point);
        let interval = self.intervals.get(idx)?;
        if !interval.contains(code_point) {
            return None;
        }
        let glyph_index = self.interval_offsets[idx] + (code_point - interval.low);
        self.glyphs.get(glyph_index as usize)
    }

    /// Payload bytes of a glyph
    pub fn glyph_data(&self, glyph: &GlyphRecord) -> Option<&[u8]> {
        self.bitmap
            .get(glyph.payload_offset as usize..glyph.payload_end() as usize)
    }
}
