//! Dymo LabelWriter raster protocol.
//!
//! Every command is `ESC <cmd> [args]`. A label is sent as: reset, bytes per
//! row, row count, one raster command per row, then form feed.

use log::{debug, info};

use crate::{
    bitmap::{row_bytes, Bitmap, MARK},
    dispatch::Dispatcher,
    error::Error,
    label::Padding,
    model::Model,
    printer::Printer,
    transport::{Transport, UsbTransport},
};

const ESC: u8 = 0x1B;
const SYN: u8 = 0x16;

/// Extra rows added to the row count. The firmware needs this to advance the
/// print head past the label; the value is an unexplained hardware
/// requirement, not a bug.
pub const ROW_COUNT_PAD: u32 = 100;

/// Number of ESC bytes sent after the reset command to resynchronise the
/// command parser.
const SYNC_LEN: usize = 84;

fn command(cmd: u8, args: &[u8]) -> Vec<u8> {
    let mut buf = vec![ESC, cmd];
    buf.extend_from_slice(args);
    buf
}

/// Reset and resync the command parser.
pub fn reset_commands() -> Vec<Vec<u8>> {
    vec![command(ESC, &[ESC; SYNC_LEN]), command(b'*', &[])]
}

/// Pack one row MSB first, bit set for every marked pixel.
pub fn pack_row(bitmap: &Bitmap, y: u32) -> Vec<u8> {
    let mut line = vec![0x00u8; row_bytes(bitmap.width())];
    for (x, pixel) in bitmap.row(y).enumerate() {
        if pixel == MARK {
            line[x / 8] |= 0x80 >> (x % 8);
        }
    }
    line
}

/// Encode a bitmap as a list of commands, each sent as one transfer.
pub fn encode_commands(bitmap: &Bitmap) -> Result<Vec<Vec<u8>>, Error> {
    let nbytes = row_bytes(bitmap.width());
    let nrows = bitmap.height() + ROW_COUNT_PAD;
    if nbytes > u8::MAX as usize || nrows > u16::MAX as u32 {
        return Err(Error::ImageTooLarge {
            width: bitmap.width(),
            height: bitmap.height(),
        });
    }

    let mut commands = reset_commands();
    commands.push(command(b'D', &[nbytes as u8]));
    commands.push(command(b'L', &(nrows as u16).to_be_bytes()));
    for y in 0..bitmap.height() {
        commands.push(command(SYN, &pack_row(bitmap, y)));
    }
    commands.push(command(b'E', &[]));
    Ok(commands)
}

/// Encode a bitmap as a single byte stream.
pub fn encode(bitmap: &Bitmap) -> Result<Vec<u8>, Error> {
    Ok(encode_commands(bitmap)?.concat())
}

/// Write commands in order, stopping at the first failed transfer.
pub fn send<T: Transport + ?Sized>(transport: &mut T, commands: &[Vec<u8>]) -> Result<(), Error> {
    for buf in commands {
        transport.send(buf)?;
    }
    Ok(())
}

/// Dymo LabelWriter printer.
pub struct DymoPrinter<T: Transport + 'static = UsbTransport> {
    model: Model,
    dispatcher: Dispatcher<T>,
}

impl DymoPrinter<UsbTransport> {
    /// Open the first attached LabelWriter 450.
    pub fn open() -> Result<Self, Error> {
        let model = Model::LabelWriter450;
        let transport = UsbTransport::open(model.vid(), model.pid())?;
        Ok(Self::with_transport(model, transport))
    }
}

impl<T: Transport + 'static> DymoPrinter<T> {
    pub fn with_transport(model: Model, transport: T) -> Self {
        DymoPrinter {
            model,
            dispatcher: Dispatcher::new(transport),
        }
    }

    pub fn reset(&mut self) -> Result<(), Error> {
        self.dispatcher.with_transport(|t| send(t, &reset_commands()))
    }

    /// Read the one byte status register.
    pub fn status(&mut self) -> Result<u8, Error> {
        self.dispatcher.with_transport(|t| {
            t.send(&command(b'A', &[]))?;
            let status = t.receive(1)?;
            debug!("status byte {:#04x}", status[0]);
            Ok(status[0])
        })
    }

    /// Read the firmware version string.
    pub fn version(&mut self) -> Result<String, Error> {
        self.dispatcher.with_transport(|t| {
            t.send(&command(b'V', &[]))?;
            let version = t.receive(10)?;
            Ok(String::from_utf8_lossy(&version).trim_end_matches('\0').to_string())
        })
    }

    pub fn form_feed(&mut self) -> Result<(), Error> {
        self.dispatcher.with_transport(|t| t.send(&command(b'E', &[])))
    }

    pub fn short_form_feed(&mut self) -> Result<(), Error> {
        self.dispatcher.with_transport(|t| t.send(&command(b'G', &[])))
    }

    /// Wait for the outstanding print job, if any.
    pub fn finish(&mut self) -> Result<(), Error> {
        self.dispatcher.wait()
    }

    pub fn into_transport(self) -> Result<T, Error> {
        self.dispatcher.into_inner()
    }
}

impl<T: Transport + 'static> Printer for DymoPrinter<T> {
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
        let commands = encode_commands(&bitmap)?;
        self.dispatcher
            .submit(move |t| send(t, &commands), background)
    }
}
