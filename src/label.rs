//! Label layout engine.
//!
//! A [`Label`] turns lines of short text elements into a monochrome bitmap
//! sized to a physical label. Each line gets a share of the usable height,
//! then the largest font size whose elements all fit their column is found
//! by binary search. Leftover height is spread evenly around the lines.

use log::debug;
use std::cell::OnceCell;

use crate::{
    bitmap::Bitmap,
    error::Error,
    font::{Anchor, BoundingBox, GlyphMetrics},
    printer::Printer,
};

const MM_PER_INCH: f64 = 25.4;

/// Separator measured between side-by-side elements of a line.
const ELEMENT_GAP: &str = "  ";

/// Share of the usable height given to each line, keyed by line count.
///
/// The first line (usually a name) dominates; later lines are secondary.
/// The font size may still shrink below this if the text is too wide.
const LINE_PORTIONS: [&[f64]; 3] = [
    &[0.9],           // Single line
    &[0.7, 0.2],      // Two lines
    &[0.5, 0.2, 0.2], // Three lines
];

/// Total share of the usable height for labels with more lines than the
/// template covers, split equally.
const FALLBACK_PORTION: f64 = 0.9;

/// Unprintable margins in millimeters.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Padding {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl Padding {
    pub const fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Padding {
            left,
            top,
            right,
            bottom,
        }
    }
}

/// Physical geometry of a label.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelConfig {
    dpi: u32,
    size_mm: (f64, f64),
    padding: Padding,
}

impl Default for LabelConfig {
    fn default() -> Self {
        LabelConfig::new(300, (89.0, 36.0))
    }
}

impl LabelConfig {
    /// Geometry for a `size_mm` (width, height) label at `dpi`, no padding.
    pub fn new(dpi: u32, size_mm: (f64, f64)) -> Self {
        LabelConfig {
            dpi,
            size_mm,
            padding: Padding::default(),
        }
    }

    /// Geometry sized for a specific printer's resolution and margins.
    pub fn for_printer(printer: &dyn Printer, size_mm: (f64, f64)) -> Self {
        LabelConfig::new(printer.dpi(), size_mm).padding(printer.padding_mm())
    }

    pub fn padding(self, padding: Padding) -> Self {
        LabelConfig { padding, ..self }
    }

    pub fn dpi(&self) -> u32 {
        self.dpi
    }

    pub fn size_mm(&self) -> (f64, f64) {
        self.size_mm
    }

    fn mm_to_px(&self, mm: f64) -> u32 {
        (mm / MM_PER_INCH * self.dpi as f64).round().max(0.0) as u32
    }
}

/// One laid out line: the chosen font size and the per-element boxes.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelLine {
    pub size: u32,
    pub elements: Vec<String>,
    pub boxes: Vec<BoundingBox>,
    pub height: i32,
}

impl LabelLine {
    fn new(size: u32, elements: Vec<String>, boxes: Vec<BoundingBox>) -> Self {
        let min_y = boxes.iter().map(|b| b.top).min().unwrap_or(0);
        let max_y = boxes.iter().map(|b| b.bottom).max().unwrap_or(0);
        LabelLine {
            size,
            elements,
            boxes,
            height: max_y - min_y,
        }
    }
}

/// A text-to-bitmap rendering request bound to a physical label.
///
/// The rendered bitmap is computed once and cached, so repeated calls to
/// [`Label::render`] return the same image.
pub struct Label<'f> {
    lines: Vec<Vec<String>>,
    font: &'f dyn GlyphMetrics,
    res: (u32, u32),
    usable: (u32, u32),
    origin: (u32, u32),
    max_line_heights: Vec<u32>,
    image: OnceCell<Bitmap>,
}

impl<'f> Label<'f> {
    pub fn new<L, S>(lines: &[L], config: LabelConfig, font: &'f dyn GlyphMetrics) -> Result<Self, Error>
    where
        L: AsRef<[S]>,
        S: AsRef<str>,
    {
        if lines.is_empty() {
            return Err(Error::InvalidLabel("no lines".to_string()));
        }
        let lines: Vec<Vec<String>> = lines
            .iter()
            .map(|l| l.as_ref().iter().map(|e| e.as_ref().to_string()).collect())
            .collect();
        if let Some(i) = lines.iter().position(|l: &Vec<String>| l.is_empty()) {
            return Err(Error::InvalidLabel(format!("line {} has no elements", i)));
        }

        let res = (config.mm_to_px(config.size_mm.0), config.mm_to_px(config.size_mm.1));
        let p = config.padding;
        let (left, top) = (config.mm_to_px(p.left), config.mm_to_px(p.top));
        let (right, bottom) = (config.mm_to_px(p.right), config.mm_to_px(p.bottom));
        if left + right >= res.0 || top + bottom >= res.1 {
            return Err(Error::InvalidLabel(format!(
                "padding leaves no usable area on a {}x{} label",
                res.0, res.1
            )));
        }
        let usable = (res.0 - left - right, res.1 - top - bottom);

        let max_line_heights = match LINE_PORTIONS.get(lines.len() - 1) {
            Some(portions) => portions
                .iter()
                .map(|p| (p * usable.1 as f64) as u32)
                .collect(),
            None => {
                let height = (FALLBACK_PORTION / lines.len() as f64 * usable.1 as f64) as u32;
                vec![height; lines.len()]
            }
        };

        Ok(Label {
            lines,
            font,
            res,
            usable,
            origin: (left, top),
            max_line_heights,
            image: OnceCell::new(),
        })
    }

    /// Canvas size in pixels.
    pub fn resolution(&self) -> (u32, u32) {
        self.res
    }

    /// Canvas size minus padding, in pixels.
    pub fn usable_resolution(&self) -> (u32, u32) {
        self.usable
    }

    /// Height budget of each line in pixels.
    pub fn max_line_heights(&self) -> &[u32] {
        &self.max_line_heights
    }

    // Measure every element of a line at `size`, returning the line and
    // whether all of its elements fit their column. Ink hanging past the
    // advance must also stay on the canvas once centered in its column.
    fn measure(&self, elements: &[String], size: u32) -> (LabelLine, bool) {
        let count = elements.len() as i32;
        let gap = self.font.bbox(ELEMENT_GAP, size, Anchor::Center).width();
        let max_elem_width = (self.usable.0 as i32 - gap * (count - 1)) / count;
        let col_width = self.column_width(elements.len());

        let boxes: Vec<BoundingBox> = elements
            .iter()
            .map(|e| self.font.bbox(e, size, Anchor::Center))
            .collect();
        let fits = boxes.iter().enumerate().all(|(i, b)| {
            let center = self.origin.0 as i32 + col_width * i as i32 + col_width / 2;
            b.width() <= max_elem_width
                && center + b.left >= 0
                && center + b.right <= self.res.0 as i32
        });
        (LabelLine::new(size, elements.to_vec(), boxes), fits)
    }

    // Columns get distributed evenly among all elements of a line.
    fn column_width(&self, count: usize) -> i32 {
        (self.usable.0 / count as u32) as i32
    }

    // Binary search for the largest font size that fits. `min_size` is the
    // last size known to fit and `max_size` the last known to be too large;
    // the search stops when the next probe repeats the current one.
    fn choose_line_size(&self, idx: usize) -> Result<LabelLine, Error> {
        let elements = &self.lines[idx];
        let fail = || Error::Layout {
            line: elements.join(ELEMENT_GAP),
        };

        let mut min_size: u32 = 1;
        let mut max_size: u32 = self.max_line_heights[idx];
        if max_size < min_size {
            return Err(fail());
        }

        let mut size = min_size + (max_size - min_size) / 2;
        loop {
            let (line, fits) = self.measure(elements, size);
            if fits {
                min_size = size;
            } else {
                max_size = size;
            }

            let next = min_size + (max_size - min_size) / 2;
            if next == size {
                if fits {
                    debug!("line {} {:?} font size {}", idx, elements, size);
                    return Ok(line);
                }
                return Err(fail());
            }
            size = next;
        }
    }

    /// Run the font size search for every line.
    pub fn layout(&self) -> Result<Vec<LabelLine>, Error> {
        (0..self.lines.len())
            .map(|i| self.choose_line_size(i))
            .collect()
    }

    /// Render the label, or return the cached bitmap from an earlier call.
    pub fn render(&self) -> Result<&Bitmap, Error> {
        if let Some(image) = self.image.get() {
            return Ok(image);
        }
        let image = self.draw()?;
        Ok(self.image.get_or_init(|| image))
    }

    fn draw(&self) -> Result<Bitmap, Error> {
        let mut img = Bitmap::new(self.res.0, self.res.1);
        let line_params = self.layout()?;

        // Distribute the lines with an equal gap between them; the top and
        // bottom gap is half the gap between lines.
        let total_height: i32 = line_params.iter().map(|lp| lp.height).sum();
        let spare_height = self.usable.1 as i32 - total_height;
        let line_gap = spare_height / line_params.len() as i32;

        let mut line_top = line_gap / 2 + self.origin.1 as i32;
        for lp in &line_params {
            let col_width = self.column_width(lp.elements.len());

            let mut x = self.origin.0 as i32 + col_width / 2;
            for elem in &lp.elements {
                self.font
                    .draw(&mut img, elem, (x, line_top), lp.size, Anchor::MiddleTop);
                x += col_width;
            }
            line_top += lp.height + line_gap;
        }
        Ok(img)
    }
}

/// Render `lines` onto a label described by `config`.
pub fn render_label<L, S>(lines: &[L], config: LabelConfig, font: &dyn GlyphMetrics) -> Result<Bitmap, Error>
where
    L: AsRef<[S]>,
    S: AsRef<str>,
{
    let label = Label::new(lines, config, font)?;
    let bitmap = label.render()?.clone();
    Ok(bitmap)
}
