use log::{debug, info};
use rusb::{Context, Device, DeviceHandle, Direction, TransferType, UsbContext};
use std::time::Duration;

use crate::error::Error;

/// Byte pipe to a single printer.
///
/// A transport is owned by exactly one execution context at a time; the
/// print dispatcher moves it into a background job and takes it back when
/// the job is joined.
pub trait Transport: Send {
    /// Write `buf` to the device, returning the number of bytes accepted.
    fn write(&mut self, buf: &[u8]) -> Result<usize, Error>;

    /// Read up to `len` bytes from the device.
    fn read(&mut self, len: usize) -> Result<Vec<u8>, Error>;

    /// Write all of `buf`, failing on a short write.
    fn send(&mut self, buf: &[u8]) -> Result<(), Error> {
        let n = self.write(buf)?;
        if n == buf.len() {
            Ok(())
        } else {
            debug!(
                "write error: bytes wrote {} != bytes supplied {}, possibly timeout ?",
                n,
                buf.len()
            );
            Err(Error::ShortTransfer {
                transferred: n,
                expected: buf.len(),
            })
        }
    }

    /// Read exactly `len` bytes, failing on a short read.
    fn receive(&mut self, len: usize) -> Result<Vec<u8>, Error> {
        let buf = self.read(len)?;
        if buf.len() == len {
            Ok(buf)
        } else {
            Err(Error::ShortTransfer {
                transferred: buf.len(),
                expected: len,
            })
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Endpoint {
    iface: u8,
    address: u8,
}

/// USB bulk transport on the first interface of the first configuration.
pub struct UsbTransport {
    handle: DeviceHandle<Context>,
    endpoint_out: Endpoint,
    endpoint_in: Endpoint,
}

impl UsbTransport {
    /// Open the first attached device matching `vendor_id:product_id` and
    /// claim its bulk OUT and bulk IN endpoints.
    pub fn open(vendor_id: u16, product_id: u16) -> Result<Self, Error> {
        let context = Context::new()?;
        let (device, handle) = Self::open_device(&context, vendor_id, product_id)?;

        let endpoint_out = Self::find_endpoint(&device, Direction::Out)?
            .ok_or(Error::MissingEndpoint(Direction::Out))?;
        let endpoint_in = Self::find_endpoint(&device, Direction::In)?
            .ok_or(Error::MissingEndpoint(Direction::In))?;
        debug!("endpoints out {:?} in {:?}", endpoint_out, endpoint_in);

        // Not supported on every platform; claiming fails later if it matters.
        if let Err(err) = handle.set_auto_detach_kernel_driver(true) {
            debug!("auto detach kernel driver unavailable: {:?}", err);
        }
        let has_kernel_driver = matches!(handle.kernel_driver_active(endpoint_out.iface), Ok(true));
        info!(" Kernel driver support is {}", has_kernel_driver);

        let config = device.config_descriptor(0)?.number();
        handle.set_active_configuration(config)?;
        handle.claim_interface(endpoint_out.iface)?;

        Ok(UsbTransport {
            handle,
            endpoint_out,
            endpoint_in,
        })
    }

    fn open_device(
        context: &Context,
        vid: u16,
        pid: u16,
    ) -> Result<(Device<Context>, DeviceHandle<Context>), Error> {
        let devices = context.devices()?;

        if devices.is_empty() {
            debug!("Failed to read device list");
            return Err(Error::DeviceListNotReadable);
        }
        for device in devices.iter() {
            let device_desc = match device.device_descriptor() {
                Ok(d) => d,
                Err(err) => {
                    debug!("{:?}", err);
                    continue;
                }
            };

            if device_desc.vendor_id() == vid && device_desc.product_id() == pid {
                let handle = device.open()?;
                info!("opened device {:04x}:{:04x}", vid, pid);
                return Ok((device, handle));
            }
        }
        debug!("No device match {:04x}:{:04x}", vid, pid);
        Err(Error::DeviceNotFound {
            vendor_id: vid,
            product_id: pid,
        })
    }

    fn find_endpoint(device: &Device<Context>, direction: Direction) -> Result<Option<Endpoint>, Error> {
        let config_desc = device.config_descriptor(0)?;
        let interface = match config_desc.interfaces().next() {
            Some(i) => i,
            None => return Ok(None),
        };
        for interface_desc in interface.descriptors().filter(|d| d.setting_number() == 0) {
            for endpoint_desc in interface_desc.endpoint_descriptors() {
                if endpoint_desc.direction() == direction
                    && endpoint_desc.transfer_type() == TransferType::Bulk
                {
                    return Ok(Some(Endpoint {
                        iface: interface_desc.interface_number(),
                        address: endpoint_desc.address(),
                    }));
                }
            }
        }
        Ok(None)
    }
}

impl Transport for UsbTransport {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Error> {
        let timeout = Duration::from_secs(10);
        Ok(self
            .handle
            .write_bulk(self.endpoint_out.address, buf, timeout)?)
    }

    fn read(&mut self, len: usize) -> Result<Vec<u8>, Error> {
        let timeout = Duration::from_secs(1);
        let mut buf = vec![0u8; len];
        let n = self
            .handle
            .read_bulk(self.endpoint_in.address, &mut buf, timeout)?;
        buf.truncate(n);
        Ok(buf)
    }
}
