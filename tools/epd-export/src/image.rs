//! Image converter (PNG/JPG/BMP -> 4-bit C array)
//!
//! Shrinks the image to fit the display, quantizes it to a small set of evenly
//! spaced grays (optionally with Floyd-Steinberg dithering) and packs two
//! palette indices per byte, first pixel in the low nibble.

use anyhow::{Context, Result};
use epd_common::{GRAY_LEVELS, NibbleOrder, PackedImage, pack_levels};
use image::imageops::{self, ColorMap, FilterType};
use image::{DynamicImage, GrayImage, Luma};
use std::path::Path;

use crate::codegen::{generate_image_source, validate_identifier};
use crate::error::ExportError;

/// Conversion settings for one image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageOptions {
    pub max_width: u32,
    pub max_height: u32,
    /// Number of gray levels, 2..=16
    pub levels: u8,
    pub dither: bool,
}

impl Default for ImageOptions {
    fn default() -> Self {
        Self {
            max_width: 1200,
            max_height: 825,
            levels: GRAY_LEVELS,
            dither: true,
        }
    }
}

impl ImageOptions {
    pub fn validate(&self) -> Result<(), ExportError> {
        if self.levels > GRAY_LEVELS {
            return Err(ExportError::invalid(format!(
                "at most {} levels of gray are supported",
                GRAY_LEVELS
            )));
        }
        if self.levels < 2 {
            return Err(ExportError::invalid("at least 2 levels of gray are required"));
        }
        if self.max_width < 1 {
            return Err(ExportError::invalid("max width cannot be lower than 1"));
        }
        if self.max_height < 1 {
            return Err(ExportError::invalid("max height cannot be lower than 1"));
        }
        Ok(())
    }
}

/// Evenly spaced grays, index 0 is black and `levels - 1` is white
#[derive(Debug, Clone)]
pub struct GrayPalette {
    values: Vec<u8>,
}

impl GrayPalette {
    pub fn new(levels: u8) -> Self {
        let steps = (levels.max(2) - 1) as f32;
        let values = (0..levels.max(2))
            .map(|i| (i as f32 * 255.0 / steps).round() as u8)
            .collect();
        Self { values }
    }

    pub fn values(&self) -> &[u8] {
        &self.values
    }

    fn nearest(&self, value: u8) -> usize {
        self.values
            .iter()
            .enumerate()
            .min_by_key(|&(_, &v)| v.abs_diff(value))
            .map_or(0, |(i, _)| i)
    }
}

impl ColorMap for GrayPalette {
    type Color = Luma<u8>;

    fn index_of(&self, color: &Luma<u8>) -> usize {
        self.nearest(color.0[0])
    }

    fn lookup(&self, index: usize) -> Option<Luma<u8>> {
        self.values.get(index).map(|&v| Luma([v]))
    }

    fn has_lookup(&self) -> bool {
        true
    }

    fn map_color(&self, color: &mut Luma<u8>) {
        color.0[0] = self.values[self.nearest(color.0[0])];
    }
}

/// Shrink an image to fit within the bounds, keeping its aspect ratio
///
/// Images that already fit are returned untouched.
pub fn fit_within(image: DynamicImage, max_width: u32, max_height: u32) -> DynamicImage {
    if image.width() <= max_width && image.height() <= max_height {
        return image;
    }
    image.resize(max_width, max_height, FilterType::Lanczos3)
}

/// Quantize a grayscale image to palette indices
pub fn quantize(mut gray: GrayImage, palette: &GrayPalette, dither: bool) -> Vec<u8> {
    if dither {
        imageops::dither(&mut gray, palette);
    }
    gray.pixels()
        .map(|pixel| palette.index_of(pixel) as u8)
        .collect()
}

/// Convert an already decoded image
pub fn convert_dynamic_image(
    image: DynamicImage,
    options: &ImageOptions,
) -> Result<PackedImage, ExportError> {
    options.validate()?;

    let fitted = fit_within(image, options.max_width, options.max_height);
    // 16-bit and alpha images collapse to 8-bit luma here
    let gray = fitted.to_luma8();
    let (width, height) = gray.dimensions();

    let palette = GrayPalette::new(options.levels);
    let indices = quantize(gray, &palette, options.dither);
    let data = pack_levels(&indices, width as usize, NibbleOrder::LowFirst);

    Ok(PackedImage {
        width,
        height,
        order: NibbleOrder::LowFirst,
        data,
    })
}

/// Load and convert an image file
pub fn convert_image_to_memory(
    input: &Path,
    options: &ImageOptions,
) -> Result<PackedImage, ExportError> {
    options.validate()?;
    let image = image::open(input)?;
    convert_dynamic_image(image, options)
}

/// Convert an image file and write its C source to `output` (stdout when `None`)
pub fn convert_image(
    input: &Path,
    name: &str,
    output: Option<&Path>,
    options: &ImageOptions,
) -> Result<()> {
    validate_identifier(name)?;
    let packed = convert_image_to_memory(input, options)
        .with_context(|| format!("Failed to convert image: {:?}", input))?;

    tracing::info!(
        "Converted image {:?}: {}x{}, {} levels{}",
        input,
        packed.width,
        packed.height,
        options.levels,
        if options.dither { ", dithered" } else { "" }
    );

    let source = generate_image_source(name, &packed)?;
    crate::write_output(output, &source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use epd_common::unpack_levels;
    use image::{ImageBuffer, Rgba};

    fn gradient(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageLuma8(ImageBuffer::from_fn(width, height, |x, _| {
            Luma([(x * 255 / (width - 1).max(1)) as u8])
        }))
    }

    #[test]
    fn test_options_validation() {
        assert!(ImageOptions::default().validate().is_ok());
        for options in [
            ImageOptions { levels: 17, ..Default::default() },
            ImageOptions { levels: 1, ..Default::default() },
            ImageOptions { max_width: 0, ..Default::default() },
            ImageOptions { max_height: 0, ..Default::default() },
        ] {
            assert!(matches!(
                options.validate(),
                Err(ExportError::InvalidArgument(_))
            ));
        }
    }

    #[test]
    fn test_palette_values() {
        assert_eq!(GrayPalette::new(2).values(), &[0, 255]);
        assert_eq!(GrayPalette::new(4).values(), &[0, 85, 170, 255]);
        let sixteen = GrayPalette::new(16);
        assert_eq!(sixteen.values().len(), 16);
        assert_eq!(sixteen.values()[1], 17);
    }

    #[test]
    fn test_palette_nearest() {
        let palette = GrayPalette::new(2);
        assert_eq!(palette.index_of(&Luma([127])), 0);
        assert_eq!(palette.index_of(&Luma([128])), 1);

        let mut color = Luma([100]);
        GrayPalette::new(4).map_color(&mut color);
        assert_eq!(color, Luma([85]));
    }

    #[test]
    fn test_fit_within_shrinks_keeping_aspect() {
        let fitted = fit_within(gradient(400, 200), 100, 100);
        assert_eq!((fitted.width(), fitted.height()), (100, 50));
    }

    #[test]
    fn test_fit_within_never_upscales() {
        let fitted = fit_within(gradient(40, 20), 100, 100);
        assert_eq!((fitted.width(), fitted.height()), (40, 20));
    }

    #[test]
    fn test_convert_without_dither_is_nearest_level() {
        let options = ImageOptions {
            levels: 16,
            dither: false,
            ..Default::default()
        };
        let packed = convert_dynamic_image(gradient(16, 1), &options).unwrap();
        assert_eq!((packed.width, packed.height), (16, 1));

        let indices = unpack_levels(&packed.data, 16, 1, NibbleOrder::LowFirst);
        assert_eq!(indices, (0..16).collect::<Vec<u8>>());
        // first pixel lives in the low nibble
        assert_eq!(packed.data[0], 0x10);
    }

    #[test]
    fn test_convert_odd_width_pads_rows() {
        let options = ImageOptions {
            dither: false,
            ..Default::default()
        };
        let white = DynamicImage::ImageLuma8(ImageBuffer::from_pixel(3, 2, Luma([255])));
        let packed = convert_dynamic_image(white, &options).unwrap();
        assert_eq!(packed.data, vec![0xFF, 0x0F, 0xFF, 0x0F]);
        assert_eq!(packed.data.len(), packed.expected_size());
    }

    #[test]
    fn test_two_levels_dithered_only_uses_black_and_white() {
        let options = ImageOptions {
            levels: 2,
            dither: true,
            ..Default::default()
        };
        let gray = DynamicImage::ImageLuma8(ImageBuffer::from_pixel(8, 8, Luma([128])));
        let packed = convert_dynamic_image(gray, &options).unwrap();
        let indices = unpack_levels(&packed.data, 8, 8, NibbleOrder::LowFirst);

        assert!(indices.iter().all(|&i| i <= 1));
        // error diffusion spreads mid gray over both levels
        assert!(indices.contains(&0));
        assert!(indices.contains(&1));
    }

    #[test]
    fn test_alpha_is_dropped() {
        let options = ImageOptions {
            dither: false,
            ..Default::default()
        };
        let transparent_white =
            DynamicImage::ImageRgba8(ImageBuffer::from_pixel(2, 1, Rgba([255, 255, 255, 0])));
        let packed = convert_dynamic_image(transparent_white, &options).unwrap();
        assert_eq!(packed.data, vec![0xFF]);
    }
}
