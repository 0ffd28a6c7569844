//! Label printing for badges and storage labels.
//!
//! This crate lays out short lines of text on a monochrome bitmap sized to a
//! physical label, and sends the bitmap to a Dymo LabelWriter or a TSPL
//! printer over USB.
//!
//! # Example
//!
//! ```rust,no_run
//! use badger_label::{DymoPrinter, Label, LabelConfig, Printer, TrueTypeFont};
//!
//! let font = TrueTypeFont::open("Arial.ttf").unwrap();
//! let mut printer = DymoPrinter::open().unwrap();
//! let config = LabelConfig::for_printer(&printer, (89.0, 36.0));
//! let label = Label::new(&[["Jane Doe"], ["Woodwork"]], config, &font).unwrap();
//! let bitmap = label.render().unwrap().clone();
//! printer.print_label(bitmap, true).unwrap();
//! printer.finish().unwrap();
//! ```

mod bitmap;
mod dispatch;
pub mod dymo;
mod error;
mod font;
mod label;
mod model;
mod printer;
mod record;
mod transport;
pub mod tspl;

#[cfg(test)]
mod testutil;

pub use crate::{
    bitmap::{row_bytes, Bitmap, MARK, WHITE},
    dispatch::Dispatcher,
    dymo::DymoPrinter,
    error::Error,
    font::{Anchor, BoundingBox, GlyphMetrics, TrueTypeFont},
    label::{render_label, Label, LabelConfig, LabelLine, Padding},
    model::Model,
    printer::{PreviewPrinter, Printer, RotatedPrinter},
    record::{storage_lines, tag_hex, MemoryStore, Record, RecordStore},
    transport::{Transport, UsbTransport},
    tspl::TsplPrinter,
};
