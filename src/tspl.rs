//! TSPL printer protocol.
//!
//! TSPL is a line oriented text command language. Each command is written as
//! its own transfer wrapped in CR-LF. The raster payload travels inside a
//! `BITMAP` command, with white pixels as set bits.

use log::info;

use crate::{
    bitmap::{row_bytes, Bitmap, MARK},
    dispatch::Dispatcher,
    error::Error,
    label::Padding,
    model::Model,
    printer::Printer,
    transport::{Transport, UsbTransport},
};

/// Horizontal offset of the bitmap in dots. This printer family prints
/// shifted without it; the value is an unexplained hardware requirement, not
/// a bug.
pub const BITMAP_X_OFFSET: u32 = 70;

/// Dots per millimeter used by the setup commands (203 dpi head).
const DOTS_PER_MM: f64 = 8.0;

/// Frame a textual command.
pub fn command(cmd: &str) -> Vec<u8> {
    format!("\r\n{}\r\n", cmd).into_bytes()
}

pub fn mm_to_dots(mm: f64) -> u32 {
    (mm * DOTS_PER_MM) as u32
}

/// Pack one row MSB first, starting from all ones and clearing the bit of
/// every marked pixel. Padding bits stay set.
pub fn pack_row(bitmap: &Bitmap, y: u32) -> Vec<u8> {
    let mut line = vec![0xFFu8; row_bytes(bitmap.width())];
    for (x, pixel) in bitmap.row(y).enumerate() {
        if pixel == MARK {
            line[x / 8] &= !(0x80 >> (x % 8));
        }
    }
    line
}

/// `BITMAP` command carrying the whole image.
pub fn bitmap_command(bitmap: &Bitmap) -> Vec<u8> {
    let nbytes = row_bytes(bitmap.width());
    let mut buf = format!(
        "\r\nBITMAP {},0,{},{},0,",
        BITMAP_X_OFFSET,
        nbytes,
        bitmap.height()
    )
    .into_bytes();
    buf.reserve(nbytes * bitmap.height() as usize + 2);
    for y in 0..bitmap.height() {
        buf.extend(pack_row(bitmap, y));
    }
    buf.extend_from_slice(b"\r\n");
    buf
}

/// Encode a bitmap as a list of commands, each sent as one transfer.
pub fn encode_commands(bitmap: &Bitmap) -> Vec<Vec<u8>> {
    vec![
        command(&format!("SIZE {},{}", bitmap.height(), bitmap.width())),
        command("DIRECTION 0"),
        command("CLS"),
        bitmap_command(bitmap),
        command("PRINT 1,1"),
    ]
}

/// Encode a bitmap as a single byte stream.
pub fn encode(bitmap: &Bitmap) -> Vec<u8> {
    encode_commands(bitmap).concat()
}

/// Write commands in order, stopping at the first failed transfer.
pub fn send<T: Transport + ?Sized>(transport: &mut T, commands: &[Vec<u8>]) -> Result<(), Error> {
    for buf in commands {
        transport.send(buf)?;
    }
    Ok(())
}

/// Gap sensor calibration for labels `label_mm` long separated by `gap_mm`.
pub fn calibrate_command(label_mm: f64, gap_mm: f64) -> Vec<u8> {
    command(&format!(
        "GAPDETECT {},{}",
        mm_to_dots(label_mm),
        mm_to_dots(gap_mm)
    ))
}

pub fn backfeed_command(distance_mm: f64) -> Vec<u8> {
    command(&format!("BACKUP {}", mm_to_dots(distance_mm)))
}

/// Printer speaking TSPL.
pub struct TsplPrinter<T: Transport + 'static = UsbTransport> {
    model: Model,
    dispatcher: Dispatcher<T>,
}

impl TsplPrinter<UsbTransport> {
    pub fn open(model: Model) -> Result<Self, Error> {
        let transport = UsbTransport::open(model.vid(), model.pid())?;
        Ok(Self::with_transport(model, transport))
    }

    /// Open the first attached Vretti 420B.
    pub fn vretti_420b() -> Result<Self, Error> {
        Self::open(Model::Vretti420B)
    }
}

impl<T: Transport + 'static> TsplPrinter<T> {
    pub fn with_transport(model: Model, transport: T) -> Self {
        TsplPrinter {
            model,
            dispatcher: Dispatcher::new(transport),
        }
    }

    fn write_command(&mut self, buf: Vec<u8>) -> Result<(), Error> {
        self.dispatcher.with_transport(move |t| t.send(&buf))
    }

    /// Feed labels until the gap sensor has learned the label and gap length.
    pub fn calibrate(&mut self, label_mm: f64, gap_mm: f64) -> Result<(), Error> {
        info!("calibrating for {}mm labels with {}mm gap", label_mm, gap_mm);
        self.write_command(calibrate_command(label_mm, gap_mm))
    }

    pub fn form_feed(&mut self) -> Result<(), Error> {
        self.write_command(command("FORMFEED"))
    }

    /// Feed to the start of the next label.
    pub fn home(&mut self) -> Result<(), Error> {
        self.write_command(command("HOME"))
    }

    /// Pull the media back by `distance_mm`.
    pub fn backfeed(&mut self, distance_mm: f64) -> Result<(), Error> {
        self.write_command(backfeed_command(distance_mm))
    }

    /// Wait for the outstanding print job, if any.
    pub fn finish(&mut self) -> Result<(), Error> {
        self.dispatcher.wait()
    }

    pub fn into_transport(self) -> Result<T, Error> {
        self.dispatcher.into_inner()
    }
}

impl<T: Transport + 'static> Printer for TsplPrinter<T> {
    fn dpi(&self) -> u32 {
        self.model.dpi()
    }

    fn padding_mm(&self) -> Padding {
        self.model.padding_mm()
    }

    fn print_label(&mut self, bitmap: Bitmap, background: bool) -> Result<(), Error> {
        info!(
            "printing {}x{} label on {:?}",
            bitmap.width(),
            bitmap.height(),
            self.model
        );
        let commands = encode_commands(&bitmap);
        self.dispatcher
            .submit(move |t| send(t, &commands), background)
    }
}
