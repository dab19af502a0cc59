//! Frame preparation for `POST /draw`

use epd_common::{NibbleOrder, pack_gray4, packed_row_len};
use image::DynamicImage;
use image::imageops::FilterType;

use crate::client::{DisplayInfo, DrawRequest};

/// A packed frame ready to be sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    /// 16 gray levels, two pixels per byte, high nibble first
    pub data: Vec<u8>,
}

impl Frame {
    /// Draw request covering the whole display from the top left corner
    pub fn full_screen(&self, clear: bool) -> DrawRequest {
        DrawRequest {
            width: self.width,
            height: self.height,
            x: 0,
            y: 0,
            clear,
        }
    }
}

/// Scale and crop `image` to exactly fill the display, then pack it
pub fn prepare_frame(image: &DynamicImage, info: &DisplayInfo) -> Frame {
    let filled = image.resize_to_fill(info.width, info.height, FilterType::Lanczos3);
    let gray = filled.to_luma8();
    let (width, height) = gray.dimensions();
    let data = pack_gray4(gray.as_raw(), width as usize, NibbleOrder::HighFirst);
    debug_assert_eq!(data.len(), packed_row_len(width as usize) * height as usize);

    Frame {
        width,
        height,
        data,
    }
}
