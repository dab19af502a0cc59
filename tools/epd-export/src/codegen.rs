//! C source generator
//!
//! Emits fonts and images in the layout the epdiy driver compiles against.
//! Field order of `EpdGlyph`, `EpdUnicodeInterval` and `EpdFont` must match
//! `epd_internals.h` exactly.

use anyhow::Result;
use epd_common::{FontTable, PackedImage};
use std::fmt::Write as FmtWrite;

use crate::error::ExportError;

/// Bytes per line in generated arrays
const BYTES_PER_LINE: usize = 16;

/// Check that `name` can be used as a C identifier prefix
pub fn validate_identifier(name: &str) -> Result<(), ExportError> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };

    if valid {
        Ok(())
    } else {
        Err(ExportError::invalid(format!(
            "'{}' is not a valid C identifier",
            name
        )))
    }
}

/// Render a code point for use inside a C comment
fn comment_char(code_point: u32) -> String {
    match char::from_u32(code_point) {
        Some('\\') => "<backslash>".to_string(),
        Some(c) if !c.is_control() => c.to_string(),
        _ => format!("U+{:04X}", code_point),
    }
}

/// Keep user supplied text from closing a block comment early
fn sanitize_comment(text: &str) -> String {
    text.replace("*/", "* /")
}

/// Generate the C source for a packed font
pub fn generate_font_source(name: &str, font: &FontTable, command_line: &str) -> Result<String> {
    let mut output = String::new();
    let glyphs = font.glyphs();
    let metrics = font.metrics();

    writeln!(output, "#pragma once")?;
    writeln!(output, "#include \"epdiy.h\"")?;

    // Provenance
    let characters: String = glyphs.iter().map(|g| comment_char(g.code_point)).collect();
    writeln!(output, "/*")?;
    writeln!(output, "Created with")?;
    writeln!(output, "{}", sanitize_comment(command_line))?;
    writeln!(
        output,
        "As '{}' with available {} characters",
        name,
        glyphs.len()
    )?;
    writeln!(output, "{}", sanitize_comment(&characters))?;
    writeln!(output, "*/")?;

    // Bitmaps
    let bitmap = font.bitmap();
    writeln!(output, "const uint8_t {}_Bitmaps[{}] = {{", name, bitmap.len())?;
    for chunk in bitmap.chunks(BYTES_PER_LINE) {
        let line: Vec<String> = chunk.iter().map(|b| format!("0x{:02X},", b)).collect();
        writeln!(output, "    {}", line.join(" "))?;
    }
    writeln!(output, "}};")?;

    // Glyphs
    writeln!(
        output,
        "// GlyphProps[width, height, advance_x, left, top, compressed_size, data_offset]"
    )?;
    writeln!(output, "const EpdGlyph {}_Glyphs[] = {{", name)?;
    for g in glyphs {
        writeln!(
            output,
            "    {{ {}, {}, {}, {}, {}, {}, {} }}, // '{}'",
            g.width,
            g.height,
            g.advance_x,
            g.bearing_left,
            g.bearing_top,
            g.payload_size,
            g.payload_offset,
            comment_char(g.code_point)
        )?;
    }
    writeln!(output, "}};")?;

    // Intervals
    writeln!(output, "const EpdUnicodeInterval {}_Intervals[] = {{", name)?;
    for (interval, offset) in font.interval_entries() {
        writeln!(
            output,
            "    {{ 0x{:X}, 0x{:X}, 0x{:X} }},",
            interval.low, interval.high, offset
        )?;
    }
    writeln!(output, "}};")?;

    // Font
    writeln!(output, "const EpdFont {} = {{", name)?;
    writeln!(
        output,
        "    {}_Bitmaps, // (*bitmap) Glyph bitmap pointer, all concatenated together",
        name
    )?;
    writeln!(output, "    {}_Glyphs, // glyphs Glyph array", name)?;
    writeln!(
        output,
        "    {}_Intervals, // intervals Valid unicode intervals for this font",
        name
    )?;
    writeln!(
        output,
        "    {}, // interval_count Number of unicode intervals.",
        font.intervals().len()
    )?;
    writeln!(
        output,
        "    {}, // compressed Does this font use compressed glyph bitmaps?",
        u8::from(font.is_compressed())
    )?;
    writeln!(
        output,
        "    {}, // advance_y Newline distance (y axis)",
        metrics.advance_y
    )?;
    writeln!(
        output,
        "    {}, // ascender Maximal height of a glyph above the base line",
        metrics.ascender
    )?;
    writeln!(
        output,
        "    {}, // descender Maximal height of a glyph below the base line",
        metrics.descender
    )?;
    writeln!(output, "}};")?;

    // Interval summary
    writeln!(output, "/*")?;
    writeln!(output, "Included intervals")?;
    for interval in font.intervals() {
        writeln!(
            output,
            "    ( {}, {}), ie. '{}' -  '{}'",
            interval.low,
            interval.high,
            sanitize_comment(&comment_char(interval.low)),
            sanitize_comment(&comment_char(interval.high))
        )?;
    }
    writeln!(output, "*/")?;

    Ok(output)
}

/// Generate the C source for a packed image
pub fn generate_image_source(name: &str, image: &PackedImage) -> Result<String> {
    let mut output = String::new();

    writeln!(output, "const uint32_t {}_width = {};", name, image.width)?;
    writeln!(output, "const uint32_t {}_height = {};", name, image.height)?;
    writeln!(
        output,
        "const uint8_t {}_data[({}*{})/2] = {{",
        name,
        image.padded_width(),
        image.height
    )?;

    let row_len = image.padded_width() as usize / 2;
    if row_len > 0 {
        for row in image.data.chunks(row_len) {
            let line: Vec<String> = row.iter().map(|b| format!("0x{:02X},", b)).collect();
            writeln!(output, "\t{}", line.join(" "))?;
        }
    }
    writeln!(output, "}};")?;

    Ok(output)
}
