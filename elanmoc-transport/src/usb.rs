//! USB bulk transport

use std::time::Duration;

use async_trait::async_trait;
use bytes::BytesMut;
use nusb::transfer::RequestBuffer;
use tokio::time::timeout;
use tracing::{debug, trace, warn};

use elanmoc_core::{constants::USB_INTERFACE, DeviceVariant};

use crate::{error::*, Transport};

/// Bulk transport to one sensor
pub struct UsbTransport {
    info: nusb::DeviceInfo,
    variant: DeviceVariant,
    device: Option<nusb::Device>,
    interface: Option<nusb::Interface>,
}

impl UsbTransport {
    /// Create a transport for an enumerated device
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unsupported`] for devices outside the ID table.
    pub fn new(info: nusb::DeviceInfo) -> Result<Self> {
        let variant = DeviceVariant::from_usb_id(info.vendor_id(), info.product_id()).ok_or(
            Error::Unsupported {
                vendor_id: info.vendor_id(),
                product_id: info.product_id(),
            },
        )?;

        Ok(Self {
            info,
            variant,
            device: None,
            interface: None,
        })
    }

    /// Enumerate connected sensors
    pub fn discover() -> Result<Vec<Self>> {
        let transports = nusb::list_devices()?
            .filter_map(|info| Self::new(info).ok())
            .collect::<Vec<_>>();

        debug!("Found {} supported sensor(s)", transports.len());
        Ok(transports)
    }

    /// First connected sensor
    pub fn find_first() -> Result<Self> {
        Self::discover()?
            .into_iter()
            .next()
            .ok_or(Error::DeviceNotFound)
    }

    pub fn variant(&self) -> DeviceVariant {
        self.variant
    }

    pub fn vendor_id(&self) -> u16 {
        self.info.vendor_id()
    }

    pub fn product_id(&self) -> u16 {
        self.info.product_id()
    }

    /// Product string reported by the device
    pub fn product_name(&self) -> Option<String> {
        self.info.product_string().map(str::to_owned)
    }

    fn interface(&self) -> Result<&nusb::Interface> {
        self.interface.as_ref().ok_or(Error::NotOpen)
    }
}

#[async_trait]
impl Transport for UsbTransport {
    async fn open(&mut self) -> Result<()> {
        if self.is_open() {
            return Err(Error::AlreadyOpen);
        }

        debug!("Opening {}...", self.describe());

        let device = self.info.open()?;
        device.reset()?;
        let interface = device.claim_interface(USB_INTERFACE)?;

        debug!("Claimed interface {} on {}", USB_INTERFACE, self.describe());

        self.device = Some(device);
        self.interface = Some(interface);
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        if self.interface.take().is_some() {
            debug!("Releasing interface on {}", self.describe());
        }
        self.device = None;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.interface.is_some()
    }

    async fn transmit(&mut self, endpoint: u8, data: &[u8], limit: Duration) -> Result<()> {
        let interface = self.interface()?;

        trace!("Sending {} bytes to 0x{:02x}: {}", data.len(), endpoint, hex::encode(data));

        let completion = timeout(limit, interface.bulk_out(endpoint, data.to_vec()))
            .await
            .map_err(|_| Error::SendTimeout { endpoint })?;
        let sent = completion.into_result()?.actual_length();

        if sent != data.len() {
            return Err(Error::ShortWrite {
                expected: data.len(),
                actual: sent,
            });
        }
        Ok(())
    }

    async fn receive(&mut self, endpoint: u8, len: usize, limit: Duration) -> Result<BytesMut> {
        let interface = self.interface()?;

        let completion = timeout(limit, interface.bulk_in(endpoint, RequestBuffer::new(len)))
            .await
            .map_err(|_| Error::ReceiveTimeout { endpoint })?;
        let data = completion.into_result()?;

        trace!("Received {} bytes from 0x{:02x}: {}", data.len(), endpoint, hex::encode(&data));

        Ok(BytesMut::from(&data[..]))
    }

    fn describe(&self) -> String {
        format!(
            "{:04x}:{:04x} (bus {} address {})",
            self.info.vendor_id(),
            self.info.product_id(),
            self.info.bus_number(),
            self.info.device_address()
        )
    }
}

impl Drop for UsbTransport {
    fn drop(&mut self) {
        if self.is_open() {
            warn!("USB transport dropped while still open");
        }
    }
}
