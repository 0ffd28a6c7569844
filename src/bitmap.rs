//! Monochrome bitmap shared by the layout engine and the printer encoders.

use image::{GrayImage, Luma};

/// Pixel value of an inked dot.
pub const MARK: u8 = 0;

/// Pixel value of the background.
pub const WHITE: u8 = 1;

/// 1-bit-per-pixel monochrome image.
///
/// Rows are stored top to bottom, each padded to a whole number of bytes with
/// the leftmost pixel in the most significant bit. A bit value of 0 is a mark
/// (ink) and 1 is white background, so a fresh bitmap is all ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    width: u32,
    height: u32,
    stride: usize,
    data: Vec<u8>,
}

impl Bitmap {
    /// Create a white bitmap.
    pub fn new(width: u32, height: u32) -> Self {
        let stride = row_bytes(width);
        Bitmap {
            width,
            height,
            stride,
            data: vec![0xFF; stride * height as usize],
        }
    }

    /// Build a bitmap from rows of pixel values (`MARK` or `WHITE`).
    ///
    /// Any non-zero value is treated as white. Rows shorter than the first
    /// are padded with white.
    pub fn from_pixels(rows: &[Vec<u8>]) -> Self {
        let width = rows.first().map(|r| r.len()).unwrap_or(0) as u32;
        let mut bitmap = Bitmap::new(width, rows.len() as u32);
        for (y, row) in rows.iter().enumerate() {
            for (x, value) in row.iter().enumerate().take(width as usize) {
                if *value == MARK {
                    bitmap.set_mark(x as u32, y as u32);
                }
            }
        }
        bitmap
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Pixel value at `(x, y)`: `MARK` (0) or `WHITE` (1).
    ///
    /// Out of range coordinates read as white.
    pub fn pixel(&self, x: u32, y: u32) -> u8 {
        if x >= self.width || y >= self.height {
            return WHITE;
        }
        let byte = self.data[y as usize * self.stride + (x / 8) as usize];
        (byte >> (7 - x % 8)) & 1
    }

    pub fn is_mark(&self, x: u32, y: u32) -> bool {
        self.pixel(x, y) == MARK
    }

    /// Ink the pixel at `(x, y)`. Out of range coordinates are clipped.
    pub fn set_mark(&mut self, x: u32, y: u32) {
        if x < self.width && y < self.height {
            self.data[y as usize * self.stride + (x / 8) as usize] &= !(0x80 >> (x % 8));
        }
    }

    /// Iterate over one row of pixel values.
    pub fn row(&self, y: u32) -> impl Iterator<Item = u8> + '_ {
        (0..self.width).map(move |x| self.pixel(x, y))
    }

    /// Number of marked pixels.
    pub fn mark_count(&self) -> usize {
        (0..self.height)
            .map(|y| self.row(y).filter(|v| *v == MARK).count())
            .sum()
    }

    /// Rotate the bitmap 90 degrees counter-clockwise.
    pub fn rotate_90(&self) -> Bitmap {
        let mut rotated = Bitmap::new(self.height, self.width);
        for y in 0..rotated.height {
            for x in 0..rotated.width {
                if self.is_mark(self.width - 1 - y, x) {
                    rotated.set_mark(x, y);
                }
            }
        }
        rotated
    }

    /// Convert to an 8-bit grayscale image, black marks on white.
    pub fn to_image(&self) -> GrayImage {
        GrayImage::from_fn(self.width, self.height, |x, y| {
            if self.is_mark(x, y) {
                Luma([0u8])
            } else {
                Luma([255u8])
            }
        })
    }
}

/// Number of bytes needed to hold `width` pixels at one bit each.
pub fn row_bytes(width: u32) -> usize {
    ((width + 7) / 8) as usize
}
