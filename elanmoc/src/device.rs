//! High-level device interface

use chrono::Local;
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

use elanmoc_core::{
    constants::{endpoints, DRIVER_FULL_NAME, ENROLL_TIMES, MAX_PRINTS},
    machine::{
        ClearStorageMachine, DeleteMachine, EnrollMachine, IdentifyMachine, ListMachine,
        MatchOutcome,
    },
    Command, Context, DeviceVariant, Event, Operation, Request, Response, Session,
    SessionConfig, StateMachine, Transition,
};
use elanmoc_transport::{Transport, UsbTransport};
use elanmoc_types::{DeviceInfo, Print};

use crate::error::{Error, Result};

/// ELAN match-on-chip fingerprint sensor
///
/// Runs one operation at a time. Each operation resolves exactly once;
/// interim feedback (finger status, enroll progress, retry hints) is sent to
/// the event channel installed with [`Device::with_events`].
///
/// # Examples
///
/// ```no_run
/// use elanmoc::{Device, Finger, Print};
///
/// #[tokio::main]
/// async fn main() -> elanmoc::Result<()> {
///     let mut device = Device::discover()?;
///     device.open().await?;
///
///     let print = device.enroll(Print::new(Finger::RightIndex)).await?;
///     println!("Enrolled: {}", print);
///
///     device.close().await?;
///     Ok(())
/// }
/// ```
pub struct Device {
    transport: Box<dyn Transport>,
    variant: DeviceVariant,
    info: DeviceInfo,
    session: Session,
    config: SessionConfig,
    events: Option<mpsc::UnboundedSender<Event>>,
}

impl Device {
    /// Create a device on top of a transport
    ///
    /// # Errors
    ///
    /// Fails when `info` names a device outside the supported ID table.
    pub fn new(transport: impl Transport + 'static, info: DeviceInfo) -> Result<Self> {
        let variant = DeviceVariant::from_usb_id(info.vendor_id, info.product_id).ok_or(
            elanmoc_transport::Error::Unsupported {
                vendor_id: info.vendor_id,
                product_id: info.product_id,
            },
        )?;

        Ok(Self {
            transport: Box::new(transport),
            variant,
            info: info.with_capacity(ENROLL_TIMES, MAX_PRINTS),
            session: Session::new(),
            config: SessionConfig::default(),
            events: None,
        })
    }

    /// Use the first supported sensor on the USB bus
    pub fn discover() -> Result<Self> {
        let transport = UsbTransport::find_first()?;
        let model = transport
            .product_name()
            .unwrap_or_else(|| DRIVER_FULL_NAME.to_string());
        let info = DeviceInfo::new(transport.vendor_id(), transport.product_id(), model);

        info!("Found {} ({})", info, transport.variant());
        Self::new(transport, info)
    }

    /// Set session configuration
    pub fn with_config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Deliver interim events to `sender`
    pub fn with_events(mut self, sender: mpsc::UnboundedSender<Event>) -> Self {
        self.events = Some(sender);
        self
    }

    /// Create an event channel and return its receiving end
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<Event> {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.events = Some(sender);
        receiver
    }

    /// Handle for cancelling the running operation from another task
    pub fn session(&self) -> Session {
        self.session.clone()
    }

    pub fn device_info(&self) -> &DeviceInfo {
        &self.info
    }

    pub fn variant(&self) -> DeviceVariant {
        self.variant
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Check if open
    pub fn is_open(&self) -> bool {
        self.session.is_open() && self.transport.is_open()
    }

    /// Open the device
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - The device cannot be reset or its interface claimed
    /// - The device is already open
    pub async fn open(&mut self) -> Result<()> {
        info!("Opening {}...", self.transport.describe());

        self.transport.open().await?;
        self.session.open()?;

        info!("Opened {}", self.info);
        Ok(())
    }

    /// Close the device
    ///
    /// Any capture still pending on the sensor is aborted.
    pub async fn close(&mut self) -> Result<()> {
        if !self.is_open() {
            return Ok(());
        }

        info!("Closing {}...", self.transport.describe());

        self.abort().await;
        self.session.close();
        self.transport.close().await?;

        info!("Closed");
        Ok(())
    }

    /// Enroll a finger
    ///
    /// The returned print carries the sensor slot and user identifier and is
    /// the record to persist for later verify and delete calls.
    pub async fn enroll(&mut self, mut template: Print) -> Result<Print> {
        template.validate()?;
        if template.enroll_date.is_none() {
            template.enroll_date = Some(Local::now().date_naive());
        }
        let nonce = Uuid::new_v4().as_u128() as u32;

        self.drive(Operation::Enroll, EnrollMachine::new(template, nonce))
            .await
    }

    /// Identify the scanned finger among `gallery`
    pub async fn identify(&mut self, gallery: Vec<Print>) -> Result<MatchOutcome> {
        self.drive(Operation::Identify, IdentifyMachine::identify(gallery))
            .await
    }

    /// Verify the scanned finger against `print`
    pub async fn verify(&mut self, print: Print) -> Result<MatchOutcome> {
        let machine = IdentifyMachine::verify(print)?;
        self.drive(Operation::Verify, machine).await
    }

    /// Delete a print from sensor storage
    pub async fn delete(&mut self, print: &Print) -> Result<()> {
        self.drive(Operation::Delete, DeleteMachine::new(print.clone()))
            .await
    }

    /// List the prints stored on the sensor
    pub async fn list(&mut self) -> Result<Vec<Print>> {
        self.drive(Operation::List, ListMachine::new()).await
    }

    /// Wipe sensor storage
    pub async fn clear_storage(&mut self) -> Result<()> {
        self.drive(Operation::ClearStorage, ClearStorageMachine::new())
            .await
    }

    /// Abort a pending capture
    ///
    /// A running operation is cancelled through [`Session::cancel`] on the
    /// handle returned by [`Device::session`]; this method covers the idle
    /// case and sends the abort command right away.
    pub async fn cancel(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.session.cancel();
        self.abort().await;
        Ok(())
    }

    // Helper methods

    fn ensure_open(&self) -> Result<()> {
        if !self.is_open() {
            return Err(Error::NotOpen);
        }
        Ok(())
    }

    /// Run an operation to completion
    async fn drive<M: StateMachine>(
        &mut self,
        operation: Operation,
        machine: M,
    ) -> Result<M::Output> {
        self.ensure_open()?;
        self.session.begin(operation)?;
        let _guard = OperationGuard(self.session.clone());

        info!(%operation, "Operation started");
        let result = self.run(machine).await;

        match &result {
            Ok(_) => info!(%operation, "Operation completed"),
            Err(e) => warn!(%operation, "Operation failed: {}", e),
        }
        result
    }

    async fn run<M: StateMachine>(&mut self, mut machine: M) -> Result<M::Output> {
        let mut ctx = Context::new(self.variant, &self.config);
        let mut state = machine.initial();
        let mut reply = None;

        loop {
            debug!(?state, "Running state");
            let step = machine.run_state(state, &mut ctx, reply.take());

            for event in step.events {
                self.emit(event);
            }

            match step.transition {
                Transition::Goto(next) => state = next,
                Transition::Transceive { request, then } => {
                    reply = self.transceive(&request).await?;
                    state = then;
                }
                Transition::Complete(output) => return Ok(output),
                Transition::Fail(error) => return Err(error.into()),
            }
        }
    }

    /// Send one request and wait for its reply
    ///
    /// Cancellation is checked before transmitting and raced against the
    /// receive of cancellable commands.
    async fn transceive(&mut self, request: &Request) -> Result<Option<Response>> {
        let command = request.command();
        let descriptor = command.descriptor();

        if self.session.is_cancel_requested() {
            self.abort().await;
            return Err(Error::Cancelled);
        }

        trace!("Sending: {:?}", request);
        self.transport
            .transmit(endpoints::CMD_OUT, request.as_bytes(), self.config.send_timeout)
            .await?;

        if !descriptor.expects_reply() {
            return Ok(None);
        }

        let session = self.session.clone();
        let receive = self.transport.receive(
            descriptor.ep_in,
            descriptor.in_len,
            self.config.receive_timeout,
        );

        let received = if descriptor.cancellable {
            tokio::select! {
                result = receive => Some(result),
                _ = session.cancelled() => None,
            }
        } else {
            Some(receive.await)
        };

        let Some(buf) = received else {
            info!(%command, "Cancelled while waiting for the sensor");
            self.abort().await;
            return Err(Error::Cancelled);
        };

        let response = Response::decode(command, buf?)?;
        trace!("Received: {:?}", response);

        Ok(Some(response))
    }

    /// Fire-and-forget abort
    async fn abort(&mut self) {
        let Some(request) = Request::prepare(Command::Abort, self.variant) else {
            return;
        };

        debug!("Sending abort command");
        if let Err(e) = self
            .transport
            .transmit(endpoints::CMD_OUT, request.as_bytes(), self.config.send_timeout)
            .await
        {
            warn!("Failed to send abort command: {}", e);
        }
    }

    fn emit(&self, event: Event) {
        debug!(?event, "Event");

        if let Some(sender) = &self.events {
            // Receiver may be gone
            let _ = sender.send(event);
        }
    }
}

/// Releases the session when an operation ends or its future is dropped
struct OperationGuard(Session);

impl Drop for OperationGuard {
    fn drop(&mut self) {
        self.0.finish();
    }
}
