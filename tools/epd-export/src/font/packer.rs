//! Glyph extraction and interval packing
//!
//! Resolves every selected code point against the font stack, packs the
//! bitmaps to 4 bits per pixel (optionally zlib compressed) into one shared
//! buffer, and derives the final interval list from the glyphs that were
//! actually found. Missing code points split or shrink the requested
//! intervals instead of leaving holes in the glyph array.

use epd_common::{
    CodePointInterval, FontMetrics, FontTable, GlyphRecord, NibbleOrder, coalesce, pack_gray4,
};
use flate2::Compression;
use flate2::write::ZlibEncoder;
use std::io::Write;

use super::selection::Selection;
use super::source::{FIXED_POINT_ONE, FaceMetrics, FontStack, describe};
use crate::error::ExportError;

/// Floor of a 26.6 value in whole pixels
#[inline]
pub fn norm_floor(value: i32) -> i32 {
    value.div_euclid(FIXED_POINT_ONE)
}

/// Ceiling of a 26.6 value in whole pixels
#[inline]
pub fn norm_ceil(value: i32) -> i32 {
    (value + FIXED_POINT_ONE - 1).div_euclid(FIXED_POINT_ONE)
}

/// Running vertical extrema over every face that produced a glyph
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsAccumulator {
    running: Option<FaceMetrics>,
}

impl MetricsAccumulator {
    pub fn observe(self, face: FaceMetrics) -> Self {
        let running = match self.running {
            None => face,
            Some(r) => FaceMetrics {
                ascender: r.ascender.max(face.ascender),
                descender: r.descender.min(face.descender),
                height: r.height.max(face.height),
            },
        };
        Self {
            running: Some(running),
        }
    }

    /// Whole-pixel metrics: ascender and line height round up, descender
    /// rounds down so the extent below the baseline is never underestimated.
    pub fn finish(self) -> FontMetrics {
        let face = self.running.unwrap_or_default();
        FontMetrics {
            advance_y: norm_ceil(face.height),
            ascender: norm_ceil(face.ascender),
            descender: norm_floor(face.descender),
        }
    }
}

/// Result of a packing pass
#[derive(Debug, Clone)]
pub struct PackedFont {
    pub table: FontTable,
    /// Intervals that were asked for
    pub requested: Vec<CodePointInterval>,
    /// Requested code points no font could provide
    pub missing: Vec<u32>,
    /// Glyphs that came from a fallback font
    pub fallback_count: usize,
    /// Size of all glyph bitmaps before compression
    pub packed_size: usize,
}

/// Builds a [`FontTable`] from a font stack in one pass
pub struct IntervalGlyphPacker<'a> {
    stack: &'a FontStack,
    compress: bool,
}

impl<'a> IntervalGlyphPacker<'a> {
    pub fn new(stack: &'a FontStack, compress: bool) -> Self {
        Self { stack, compress }
    }

    /// Resolve a selection against the stack and pack it
    pub fn pack(&self, selection: &Selection) -> Result<PackedFont, ExportError> {
        let requested = selection.resolve(self.stack)?;
        self.pack_intervals(&requested)
    }

    /// Pack every code point of the given intervals
    ///
    /// The intervals are coalesced first, so overlapping input never yields
    /// duplicate glyphs.
    pub fn pack_intervals(
        &self,
        requested: &[CodePointInterval],
    ) -> Result<PackedFont, ExportError> {
        let requested = coalesce(requested.iter().copied());

        let mut glyphs = Vec::new();
        let mut bitmap = Vec::new();
        let mut metrics = MetricsAccumulator::default();
        let mut missing = Vec::new();
        let mut fallback_count = 0;
        let mut packed_size = 0;

        for interval in &requested {
            tracing::debug!("Packing interval {}", interval);

            for code_point in interval.code_points() {
                let Some(resolved) = self.stack.resolve(code_point) else {
                    tracing::warn!(
                        "{} ({})",
                        ExportError::MissingGlyph { code_point },
                        describe(code_point)
                    );
                    missing.push(code_point);
                    continue;
                };

                if resolved.source_index > 0 {
                    fallback_count += 1;
                }
                metrics = metrics.observe(resolved.face);

                let glyph = resolved.glyph;
                let packed = pack_gray4(&glyph.bitmap, glyph.width as usize, NibbleOrder::HighFirst);
                packed_size += packed.len();

                let payload = if self.compress {
                    deflate(&packed)?
                } else {
                    packed
                };

                glyphs.push(GlyphRecord {
                    code_point,
                    width: glyph.width,
                    height: glyph.height,
                    advance_x: norm_floor(glyph.advance_x),
                    bearing_left: glyph.left,
                    bearing_top: glyph.top,
                    payload_size: payload.len() as u32,
                    payload_offset: bitmap.len() as u32,
                });
                bitmap.extend_from_slice(&payload);
            }
        }

        if glyphs.is_empty() {
            return Err(ExportError::EmptyFontTable);
        }

        let table = FontTable::new(glyphs, bitmap, self.compress, metrics.finish());

        Ok(PackedFont {
            table,
            requested,
            missing,
            fallback_count,
            packed_size,
        })
    }
}

/// zlib-compress a packed glyph bitmap
pub fn deflate(data: &[u8]) -> Result<Vec<u8>, ExportError> {
    let mut encoder = ZlibEncoder::new(Vec::with_capacity(data.len() / 2 + 8), Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::selection::Validation;
    use crate::font::testing::{MapSource, stack};
    use epd_common::{is_coalesced, unpack_gray4};
    use flate2::read::ZlibDecoder;
    use std::io::Read;

    fn iv(low: u32, high: u32) -> CodePointInterval {
        CodePointInterval::new(low, high).unwrap()
    }

    fn bounds(table: &FontTable) -> Vec<(u32, u32)> {
        table.intervals().iter().map(|i| (i.low, i.high)).collect()
    }

    #[test]
    fn test_norm_rounding() {
        assert_eq!(norm_floor(64), 1);
        assert_eq!(norm_floor(65), 1);
        assert_eq!(norm_floor(-1), -1);
        assert_eq!(norm_floor(-64), -1);
        assert_eq!(norm_floor(-65), -2);
        assert_eq!(norm_ceil(64), 1);
        assert_eq!(norm_ceil(65), 2);
        assert_eq!(norm_ceil(-1), 0);
        assert_eq!(norm_ceil(-65), -1);
    }

    #[test]
    fn test_metrics_accumulate_extrema() {
        let metrics = MetricsAccumulator::default()
            .observe(FaceMetrics {
                ascender: 10 * 64 + 1,
                descender: -3 * 64,
                height: 14 * 64,
            })
            .observe(FaceMetrics {
                ascender: 8 * 64,
                descender: -4 * 64 - 10,
                height: 15 * 64 + 5,
            })
            .finish();

        assert_eq!(
            metrics,
            FontMetrics {
                advance_y: 16,
                ascender: 11,
                descender: -5,
            }
        );
    }

    #[test]
    fn test_adjacent_code_points_form_one_interval() {
        let stack = stack(vec![MapSource::new("primary", &['A', 'B'], 10)]);
        let packed = IntervalGlyphPacker::new(&stack, false)
            .pack(&Selection::text(" AB", Validation::Primary))
            .unwrap();

        assert_eq!(bounds(&packed.table), vec![(65, 66)]);
        assert_eq!(packed.table.interval_offsets(), &[0]);
        assert!(packed.missing.is_empty());
    }

    #[test]
    fn test_missing_code_point_splits_interval() {
        let stack = stack(vec![MapSource::new("primary", &['A', 'B', 'D', 'E'], 10)]);
        let packed = IntervalGlyphPacker::new(&stack, false)
            .pack_intervals(&[iv(65, 69)])
            .unwrap();

        assert_eq!(bounds(&packed.table), vec![(65, 66), (68, 69)]);
        assert_eq!(packed.table.interval_offsets(), &[0, 2]);
        assert_eq!(packed.missing, vec![67]);
        assert_eq!(packed.table.glyph_count(), 4);
        assert!(packed.table.find_glyph(67).is_none());
        assert_eq!(packed.table.find_glyph(68).map(|g| g.code_point), Some(68));
    }

    #[test]
    fn test_missing_edges_shrink_interval() {
        let stack = stack(vec![MapSource::new("primary", &['B', 'C'], 10)]);
        let packed = IntervalGlyphPacker::new(&stack, false)
            .pack_intervals(&[iv(65, 68)])
            .unwrap();

        assert_eq!(bounds(&packed.table), vec![(66, 67)]);
        assert_eq!(packed.missing, vec![65, 68]);
    }

    #[test]
    fn test_intervals_always_coalesced() {
        let stack = stack(vec![MapSource::new(
            "primary",
            &['a', 'b', 'c', 'x', 'y', '~'],
            10,
        )]);
        let packed = IntervalGlyphPacker::new(&stack, false)
            .pack_intervals(&[iv(0x61, 0x62), iv(0x62, 0x63), iv(0x64, 0x7E)])
            .unwrap();

        assert!(is_coalesced(packed.table.intervals()));
        assert_eq!(
            bounds(&packed.table),
            vec![(0x61, 0x63), (0x78, 0x79), (0x7E, 0x7E)]
        );
    }

    #[test]
    fn test_payload_offsets_are_contiguous() {
        let stack = stack(vec![MapSource::new("primary", &['A', 'B', 'C', 'Z'], 10)]);

        for compress in [false, true] {
            let packed = IntervalGlyphPacker::new(&stack, compress)
                .pack_intervals(&[iv(65, 90)])
                .unwrap();
            let glyphs = packed.table.glyphs();

            assert_eq!(glyphs[0].payload_offset, 0);
            for pair in glyphs.windows(2) {
                assert_eq!(pair[1].payload_offset, pair[0].payload_end());
            }
            assert_eq!(
                glyphs.last().unwrap().payload_end() as usize,
                packed.table.bitmap().len()
            );
        }
    }

    #[test]
    fn test_fallback_source_is_used() {
        let stack = stack(vec![
            MapSource::new("primary", &['A'], 10),
            MapSource::new("fallback", &['B'], 12),
        ]);
        let packed = IntervalGlyphPacker::new(&stack, false)
            .pack_intervals(&[iv(65, 66)])
            .unwrap();

        assert_eq!(bounds(&packed.table), vec![(65, 66)]);
        assert_eq!(packed.fallback_count, 1);
        // the fallback face is taller and drives the font metrics
        assert_eq!(packed.table.metrics().ascender, 12);

        let b = packed.table.find_glyph(66).unwrap();
        let data = packed.table.glyph_data(b).unwrap();
        let expected = MapSource::new("fallback", &['B'], 12).raster('B' as u32);
        assert_eq!(
            unpack_gray4(data, b.width as usize, b.height as usize, NibbleOrder::HighFirst),
            expected
                .bitmap
                .iter()
                .map(|&v| epd_common::expand_gray4(epd_common::quantize_gray4(v)))
                .collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_unsupported_selection_is_empty_font_table() {
        let stack = stack(vec![MapSource::new("primary", &['A'], 10)]);
        let result = IntervalGlyphPacker::new(&stack, false).pack_intervals(&[iv(0x3000, 0x3010)]);
        assert!(matches!(result, Err(ExportError::EmptyFontTable)));
    }

    #[test]
    fn test_text_selection_with_nothing_available_is_empty() {
        let stack = stack(vec![MapSource::new("primary", &['A'], 10)]);
        let result = IntervalGlyphPacker::new(&stack, false)
            .pack(&Selection::text("\u{3042}", Validation::Primary));
        assert!(matches!(result, Err(ExportError::EmptyFontTable)));
    }

    #[test]
    fn test_compressed_payload_inflates_to_packed_bitmap() {
        let stack = stack(vec![MapSource::new("primary", &['Q'], 10)]);
        let packed = IntervalGlyphPacker::new(&stack, true)
            .pack_intervals(&[iv(0x51, 0x51)])
            .unwrap();
        assert!(packed.table.is_compressed());

        let glyph = packed.table.find_glyph(0x51).unwrap();
        let mut inflated = Vec::new();
        ZlibDecoder::new(packed.table.glyph_data(glyph).unwrap())
            .read_to_end(&mut inflated)
            .unwrap();

        let raster = MapSource::new("primary", &['Q'], 10).raster(0x51);
        assert_eq!(
            inflated,
            pack_gray4(&raster.bitmap, raster.width as usize, NibbleOrder::HighFirst)
        );
        assert_eq!(packed.packed_size, inflated.len());
    }

    #[test]
    fn test_glyph_metrics_are_normalized() {
        let stack = stack(vec![MapSource::new("primary", &['A'], 10)]);
        let packed = IntervalGlyphPacker::new(&stack, false)
            .pack_intervals(&[iv(65, 65)])
            .unwrap();
        let glyph = packed.table.glyphs()[0];
        let raster = MapSource::new("primary", &['A'], 10).raster(65);

        assert_eq!(glyph.advance_x, norm_floor(raster.advance_x));
        assert_eq!(glyph.bearing_left, raster.left);
        assert_eq!(glyph.bearing_top, raster.top);
        assert_eq!(glyph.width, raster.width);
        assert_eq!(glyph.height, raster.height);
    }
}
