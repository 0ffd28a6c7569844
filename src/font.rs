//! Glyph metrics and rasterization.
//!
//! The layout engine only sees the [`GlyphMetrics`] trait, so any font engine
//! (or a fixed-advance fake in tests) can stand behind it. [`TrueTypeFont`] is
//! the real implementation on top of `rusttype`.

use log::debug;
use rusttype::{point, Font, PositionedGlyph, Scale, VMetrics};
use std::path::Path;

use crate::{bitmap::Bitmap, error::Error};

/// Tight box around rendered text, relative to the anchor point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BoundingBox {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl BoundingBox {
    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }
}

/// Reference point of a piece of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    /// Horizontal middle, vertical middle between ascender and descender.
    Center,
    /// Horizontal middle, ascender line.
    MiddleTop,
}

/// Font capability required by the layout engine.
pub trait GlyphMetrics {
    /// Bounding box of `text` at pixel `size`, relative to `anchor`.
    fn bbox(&self, text: &str, size: u32, anchor: Anchor) -> BoundingBox;

    /// Draw `text` in black onto `bitmap` with `anchor` placed at `position`.
    fn draw(&self, bitmap: &mut Bitmap, text: &str, position: (i32, i32), size: u32, anchor: Anchor);
}

/// Coverage above which a rasterized glyph pixel becomes a mark.
const COVERAGE_THRESHOLD: f32 = 0.5;

/// A TrueType / OpenType font.
pub struct TrueTypeFont {
    font: Font<'static>,
}

impl TrueTypeFont {
    pub fn from_bytes(data: Vec<u8>) -> Result<Self, Error> {
        match Font::try_from_vec(data) {
            Some(font) => Ok(TrueTypeFont { font }),
            None => Err(Error::Font("not a valid TrueType font".to_string())),
        }
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref();
        debug!("loading font {}", path.display());
        let data = std::fs::read(path)
            .map_err(|e| Error::Font(format!("{}: {}", path.display(), e)))?;
        Self::from_bytes(data)
    }

    // rusttype scales the ascender-to-descender height; `size` is the em size.
    fn scale(&self, size: u32) -> Scale {
        let v = self.font.v_metrics_unscaled();
        let em = self.font.units_per_em() as f32;
        Scale::uniform(size as f32 * (v.ascent - v.descent) / em)
    }

    // Lay out `text` with the baseline origin at `(x, y)`.
    fn layout(&self, text: &str, size: u32, x: f32, y: f32) -> Vec<PositionedGlyph<'_>> {
        self.font.layout(text, self.scale(size), point(x, y)).collect()
    }

    fn advance(glyphs: &[PositionedGlyph<'_>], origin_x: f32) -> f32 {
        match glyphs.last() {
            Some(g) => g.position().x + g.unpositioned().h_metrics().advance_width - origin_x,
            None => 0.0,
        }
    }

    // Offset of the anchor point from the baseline origin.
    fn anchor_offset(advance: f32, v: VMetrics, anchor: Anchor) -> (f32, f32) {
        match anchor {
            Anchor::Center => (advance / 2.0, (-v.ascent - v.descent) / 2.0),
            Anchor::MiddleTop => (advance / 2.0, -v.ascent),
        }
    }
}

impl GlyphMetrics for TrueTypeFont {
    fn bbox(&self, text: &str, size: u32, anchor: Anchor) -> BoundingBox {
        let v = self.font.v_metrics(self.scale(size));
        let glyphs = self.layout(text, size, 0.0, 0.0);
        let advance = Self::advance(&glyphs, 0.0);

        // Horizontal extent covers the advance so whitespace still has a width.
        let mut left = 0.0f32;
        let mut right = advance;
        let mut top: Option<f32> = None;
        let mut bottom: Option<f32> = None;
        for bb in glyphs.iter().filter_map(|g| g.pixel_bounding_box()) {
            left = left.min(bb.min.x as f32);
            right = right.max(bb.max.x as f32);
            top = Some(top.map_or(bb.min.y as f32, |t| t.min(bb.min.y as f32)));
            bottom = Some(bottom.map_or(bb.max.y as f32, |b| b.max(bb.max.y as f32)));
        }
        let top = top.unwrap_or(-v.ascent);
        let bottom = bottom.unwrap_or(-v.descent);

        let (dx, dy) = Self::anchor_offset(advance, v, anchor);
        BoundingBox {
            left: (left - dx).round() as i32,
            top: (top - dy).round() as i32,
            right: (right - dx).round() as i32,
            bottom: (bottom - dy).round() as i32,
        }
    }

    fn draw(&self, bitmap: &mut Bitmap, text: &str, position: (i32, i32), size: u32, anchor: Anchor) {
        let v = self.font.v_metrics(self.scale(size));
        let advance = Self::advance(&self.layout(text, size, 0.0, 0.0), 0.0);
        let (dx, dy) = Self::anchor_offset(advance, v, anchor);
        let origin_x = position.0 as f32 - dx;
        let origin_y = position.1 as f32 - dy;

        for glyph in self.layout(text, size, origin_x, origin_y) {
            if let Some(bb) = glyph.pixel_bounding_box() {
                glyph.draw(|gx, gy, coverage| {
                    let x = bb.min.x + gx as i32;
                    let y = bb.min.y + gy as i32;
                    if coverage >= COVERAGE_THRESHOLD && x >= 0 && y >= 0 {
                        bitmap.set_mark(x as u32, y as u32);
                    }
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::dejavu_sans;

    #[test]
    fn bbox_dimensions() {
        let bb = BoundingBox {
            left: -10,
            top: -4,
            right: 12,
            bottom: 6,
        };
        assert_eq!(bb.width(), 22);
        assert_eq!(bb.height(), 10);
    }

    #[test]
    fn rejects_invalid_font_data() {
        match TrueTypeFont::from_bytes(vec![0, 1, 2, 3]) {
            Err(Error::Font(_)) => {}
            Err(e) => panic!("unexpected error {:?}", e),
            Ok(_) => panic!("garbage parsed as a font"),
        }
    }

    const SIZE: u32 = 100;

    #[test]
    fn size_is_em_size() {
        let font = dejavu_sans();
        // DejaVu Sans caps are 0.729 em tall.
        let h = font.bbox("H", SIZE, Anchor::Center).height();
        assert!((72..=75).contains(&h), "cap height {}", h);
    }

    #[test]
    fn center_anchor_sits_between_ascender_and_descender() {
        let font = dejavu_sans();
        let v = font.font.v_metrics(font.scale(SIZE));
        let half = ((v.ascent - v.descent) / 2.0).round() as i32;

        let center = font.bbox("Hg", SIZE, Anchor::Center);
        let top = font.bbox("Hg", SIZE, Anchor::MiddleTop);
        assert!((top.top - center.top - half).abs() <= 1);
        assert!(center.top >= -half - 1 && center.bottom <= half + 1);

        // Without ink the box spans exactly ascender to descender.
        let blank = font.bbox(" ", SIZE, Anchor::Center);
        assert!((blank.top + blank.bottom).abs() <= 1);
        assert!((blank.height() - 2 * half).abs() <= 1);
    }

    #[test]
    fn whitespace_has_width() {
        let font = dejavu_sans();
        let gap = font.bbox("  ", SIZE, Anchor::Center);
        assert!(gap.width() > 0);
        assert!(font.bbox("a  b", SIZE, Anchor::Center).width() > font.bbox("ab", SIZE, Anchor::Center).width());
    }

    #[test]
    fn middle_top_draw_hangs_below_anchor() {
        let font = dejavu_sans();
        let mut bitmap = Bitmap::new(400, 200);
        let (x, y) = (200, 50);
        font.draw(&mut bitmap, "H", (x, y), SIZE, Anchor::MiddleTop);

        let marks: Vec<(u32, u32)> = (0..bitmap.height())
            .flat_map(|py| (0..bitmap.width()).map(move |px| (px, py)))
            .filter(|&(px, py)| bitmap.is_mark(px, py))
            .collect();
        assert!(!marks.is_empty());
        assert!(marks.iter().all(|&(_, py)| py >= y as u32));

        let min_x = marks.iter().map(|m| m.0).min().unwrap() as f32;
        let max_x = marks.iter().map(|m| m.0).max().unwrap() as f32;
        let mid = (min_x + max_x + 1.0) / 2.0;
        assert!((mid - x as f32).abs() <= 1.0, "ink centered at {}", mid);
    }

    #[test]
    fn drawn_ink_matches_bbox() {
        let font = dejavu_sans();
        let mut bitmap = Bitmap::new(400, 200);
        let bb = font.bbox("Hg", SIZE, Anchor::Center);
        font.draw(&mut bitmap, "Hg", (200, 100), SIZE, Anchor::Center);

        let rows: Vec<u32> = (0..bitmap.height())
            .filter(|&py| (0..bitmap.width()).any(|px| bitmap.is_mark(px, py)))
            .collect();
        let first = *rows.first().unwrap() as i32 - 100;
        let last = *rows.last().unwrap() as i32 - 100 + 1;
        // Edge rows under half coverage are dropped.
        assert!((first - bb.top).abs() <= 1, "top {} vs {}", first, bb.top);
        assert!((last - bb.bottom).abs() <= 2, "bottom {} vs {}", last, bb.bottom);
    }

    #[test]
    fn missing_font_file() {
        assert!(matches!(
            TrueTypeFont::open("/nonexistent/font.ttf"),
            Err(Error::Font(_))
        ));
    }
}
