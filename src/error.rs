//! Error types for label layout and printer operations.
//!
//! This module defines all possible errors that can occur while fitting text
//! onto a label, talking to a printer over USB, or looking up badge records.

use rusb;
use thiserror::Error;

/// Main error type for the crate.
///
/// Every error is terminal for the operation that raised it. Nothing in the
/// crate retries internally: a half-printed label cannot be resumed.
#[derive(Error, Debug)]
pub enum Error {
    /// A line of text cannot be rendered within the usable width at any
    /// positive font size.
    #[error("Cannot fit line {line:?}")]
    Layout { line: String },

    /// The label has no lines, an empty line, or no usable area once padding
    /// is removed.
    #[error("Invalid label: {0}")]
    InvalidLabel(String),

    /// The bitmap does not fit the printer's framing fields.
    #[error("Image of {width}x{height} pixels is too large for the printer")]
    ImageTooLarge { width: u32, height: u32 },

    /// The font file could not be loaded.
    #[error("Font error: {0}")]
    Font(String),

    /// USB communication error.
    ///
    /// Wraps underlying rusb errors for device communication issues,
    /// timeouts, or permission problems.
    #[error(transparent)]
    UsbError(#[from] rusb::Error),

    /// No device with the requested vendor and product id is attached.
    #[error("Device {vendor_id:04x}:{product_id:04x} not found")]
    DeviceNotFound { vendor_id: u16, product_id: u16 },

    #[error("Can't read device list, permission issue ?")]
    DeviceListNotReadable,

    #[error("Device is missing {0:?} bulk endpoint")]
    MissingEndpoint(rusb::Direction),

    /// The device accepted fewer bytes than supplied, or returned fewer
    /// than requested.
    #[error("Short transfer: {transferred} of {expected} bytes")]
    ShortTransfer { transferred: usize, expected: usize },

    /// A background print job panicked before reporting its result.
    #[error("Print job panicked")]
    JobPanicked,

    /// The printer connection was lost with a failed background job.
    #[error("Printer connection is no longer available")]
    ConnectionLost,

    #[error("Tag {0} not found")]
    RecordNotFound(String),

    #[error("Tag {0} already enrolled")]
    DuplicateRecord(String),

    #[error(transparent)]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
