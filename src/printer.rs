use log::info;
use std::path::{Path, PathBuf};

use crate::{bitmap::Bitmap, error::Error, label::Padding};

/// A label printer.
///
/// Exposes the resolution and margins a label must be laid out for, and
/// prints a finished bitmap. With `background` set the printer may return
/// before the label has been transmitted; the next call waits for it.
pub trait Printer {
    fn dpi(&self) -> u32;

    /// Margins in millimeters (left, top, right, bottom).
    fn padding_mm(&self) -> Padding;

    fn print_label(&mut self, bitmap: Bitmap, background: bool) -> Result<(), Error>;
}

impl<P: Printer + ?Sized> Printer for Box<P> {
    fn dpi(&self) -> u32 {
        (**self).dpi()
    }

    fn padding_mm(&self) -> Padding {
        (**self).padding_mm()
    }

    fn print_label(&mut self, bitmap: Bitmap, background: bool) -> Result<(), Error> {
        (**self).print_label(bitmap, background)
    }
}

/// Stand-in printer that saves each label as a PNG file.
///
/// Used for previews and when no physical printer can be opened.
pub struct PreviewPrinter {
    path: PathBuf,
}

impl PreviewPrinter {
    pub const DPI: u32 = 300;
    pub const PADDING: Padding = Padding::new(2.0, 0.0, 2.0, 0.0);

    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        PreviewPrinter {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Printer for PreviewPrinter {
    fn dpi(&self) -> u32 {
        Self::DPI
    }

    fn padding_mm(&self) -> Padding {
        Self::PADDING
    }

    fn print_label(&mut self, bitmap: Bitmap, _background: bool) -> Result<(), Error> {
        bitmap.to_image().save(&self.path)?;
        info!("label preview written to {}", self.path.display());
        Ok(())
    }
}

/// Printer wrapper that turns every label 90 degrees counter-clockwise,
/// for printers that feed labels sideways.
pub struct RotatedPrinter<P> {
    inner: P,
}

impl<P: Printer> RotatedPrinter<P> {
    pub fn new(inner: P) -> Self {
        RotatedPrinter { inner }
    }

    pub fn into_inner(self) -> P {
        self.inner
    }
}

impl<P: Printer> Printer for RotatedPrinter<P> {
    fn dpi(&self) -> u32 {
        self.inner.dpi()
    }

    fn padding_mm(&self) -> Padding {
        self.inner.padding_mm()
    }

    fn print_label(&mut self, bitmap: Bitmap, background: bool) -> Result<(), Error> {
        self.inner.print_label(bitmap.rotate_90(), background)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::label::{render_label, LabelConfig};
    use crate::testutil::MockFont;

    #[derive(Default)]
    struct Capture {
        printed: Vec<(Bitmap, bool)>,
    }

    impl Printer for Capture {
        fn dpi(&self) -> u32 {
            203
        }

        fn padding_mm(&self) -> Padding {
            Padding::new(3.0, 0.0, 3.0, 0.0)
        }

        fn print_label(&mut self, bitmap: Bitmap, background: bool) -> Result<(), Error> {
            self.printed.push((bitmap, background));
            Ok(())
        }
    }

    #[test]
    fn rotated_printer_forwards_capabilities() {
        let mut printer = RotatedPrinter::new(Capture::default());
        assert_eq!(printer.dpi(), 203);
        assert_eq!(printer.padding_mm(), Padding::new(3.0, 0.0, 3.0, 0.0));

        let mut bitmap = Bitmap::new(8, 2);
        bitmap.set_mark(7, 0);
        printer.print_label(bitmap, true).unwrap();

        let capture = printer.into_inner();
        let (printed, background) = &capture.printed[0];
        assert!(*background);
        assert_eq!((printed.width(), printed.height()), (2, 8));
        assert!(printed.is_mark(0, 0));
    }

    #[test]
    fn label_sized_for_printer() {
        let printer: Box<dyn Printer> = Box::new(Capture::default());
        let config = LabelConfig::for_printer(&printer, (89.0, 36.0));
        assert_eq!(config.dpi(), 203);

        let bitmap = render_label(&[["Jane"]], config, &MockFont).unwrap();
        // 3mm = 24 dots at 203 dpi; nothing is drawn in the margins.
        let (w, h) = (bitmap.width(), bitmap.height());
        assert_eq!((w, h), (711, 288));
        for y in 0..h {
            assert!((0..24).all(|x| !bitmap.is_mark(x, y)));
            assert!((w - 24..w).all(|x| !bitmap.is_mark(x, y)));
        }
    }

    #[test]
    fn preview_writes_png() {
        let path = std::env::temp_dir().join(format!("badger-preview-{}.png", std::process::id()));
        let mut printer = PreviewPrinter::new(&path);
        let mut bitmap = Bitmap::new(16, 4);
        bitmap.set_mark(3, 1);
        printer.print_label(bitmap, false).unwrap();

        let img = image::open(&path).unwrap().to_luma8();
        assert_eq!(img.dimensions(), (16, 4));
        assert_eq!(img.get_pixel(3, 1)[0], 0);
        assert_eq!(img.get_pixel(0, 0)[0], 255);
        std::fs::remove_file(&path).ok();
    }
}
