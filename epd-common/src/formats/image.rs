//! Packed 4-bit image

use crate::packing::{NibbleOrder, packed_row_len};

/// A 4-bit-per-pixel image, rows padded to whole bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedImage {
    pub width: u32,
    pub height: u32,
    pub order: NibbleOrder,
    pub data: Vec<u8>,
}

impl PackedImage {
    /// Width rounded up to an even number of pixels
    pub fn padded_width(&self) -> u32 {
        self.width.div_ceil(2) * 2
    }

    /// Expected data size in bytes
    pub fn expected_size(&self) -> usize {
        packed_row_len(self.width as usize) * self.height as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sizes_for_odd_width() {
        let image = PackedImage {
            width: 5,
            height: 3,
            order: NibbleOrder::LowFirst,
            data: vec![0; 9],
        };
        assert_eq!(image.padded_width(), 6);
        assert_eq!(image.expected_size(), 9);
    }
}
