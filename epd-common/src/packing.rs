//! 4-bit grayscale packing utilities
//!
//! The display works in 16 gray levels, two pixels per byte:
//! - 8-bit sample → 4-bit level (nearest of 16 evenly spaced grays)
//! - 4-bit levels → packed bytes, one row at a time
//!
//! Glyph bitmaps and framebuffers pushed over HTTP put the first pixel of a pair
//! in the high nibble. The driver's static image arrays put it in the low nibble.
//! Rows never share a byte: an odd-width row ends with a zero nibble.

// ============================================================================
// Levels
// ============================================================================

/// Number of gray levels the display can show
pub const GRAY_LEVELS: u8 = 16;

/// Which nibble of a packed byte holds the even-index pixel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NibbleOrder {
    /// First pixel in bits 4..8 (glyph bitmaps, `/draw` payloads)
    HighFirst,
    /// First pixel in bits 0..4 (image arrays)
    LowFirst,
}

/// Quantize an 8-bit gray sample to the nearest 4-bit level
///
/// Levels are spaced 17 apart (0, 17, ..., 255), so this is `round(v / 17)`.
#[inline]
pub fn quantize_gray4(value: u8) -> u8 {
    ((value as u32 * 15 + 127) / 255) as u8
}

/// Expand a 4-bit level back to its 8-bit gray value
#[inline]
pub fn expand_gray4(level: u8) -> u8 {
    (level & 0x0F) * 17
}

/// Bytes needed for one packed row of `width` pixels
#[inline]
pub const fn packed_row_len(width: usize) -> usize {
    width.div_ceil(2)
}

// ============================================================================
// Packing
// ============================================================================

/// Pack row-major 4-bit levels, two per byte
///
/// Values above 15 are masked to their low nibble. A trailing partial row is
/// packed like a full one.
pub fn pack_levels(levels: &[u8], width: usize, order: NibbleOrder) -> Vec<u8> {
    if width == 0 || levels.is_empty() {
        return Vec::new();
    }

    let rows = levels.len().div_ceil(width);
    let mut packed = Vec::with_capacity(rows * packed_row_len(width));

    for row in levels.chunks(width) {
        for pair in row.chunks(2) {
            let first = pair[0] & 0x0F;
            let second = pair.get(1).map_or(0, |v| v & 0x0F);
            packed.push(match order {
                NibbleOrder::HighFirst => (first << 4) | second,
                NibbleOrder::LowFirst => (second << 4) | first,
            });
        }
    }

    packed
}

/// Quantize row-major 8-bit samples and pack them, two per byte
pub fn pack_gray4(samples: &[u8], width: usize, order: NibbleOrder) -> Vec<u8> {
    let levels: Vec<u8> = samples.iter().copied().map(quantize_gray4).collect();
    pack_levels(&levels, width, order)
}

// ============================================================================
// Unpacking
// ============================================================================

/// Unpack a packed buffer back into row-major 4-bit levels
///
/// Padding nibbles of odd-width rows are dropped. Missing trailing bytes read
/// as zero.
pub fn unpack_levels(packed: &[u8], width: usize, height: usize, order: NibbleOrder) -> Vec<u8> {
    let row_len = packed_row_len(width);
    let mut levels = Vec::with_capacity(width * height);

    for y in 0..height {
        for x in 0..width {
            let byte = packed.get(y * row_len + x / 2).copied().unwrap_or(0);
            let high = x % 2 == 0;
            let level = match (order, high) {
                (NibbleOrder::HighFirst, true) | (NibbleOrder::LowFirst, false) => byte >> 4,
                _ => byte & 0x0F,
            };
            levels.push(level);
        }
    }

    levels
}

/// Unpack a packed buffer back into 8-bit gray samples
pub fn unpack_gray4(packed: &[u8], width: usize, height: usize, order: NibbleOrder) -> Vec<u8> {
    unpack_levels(packed, width, height, order)
        .into_iter()
        .map(expand_gray4)
        .collect()
}
