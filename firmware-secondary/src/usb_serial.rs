//! USB CDC-ACM serial port: control channel in, diagnostics out.

use core::fmt::Write as _;

use embassy_rp::peripherals::USB;
use embassy_rp::usb::Driver;
use embassy_usb::class::cdc_acm::{CdcAcmClass, Receiver, Sender, State};
use embassy_usb::driver::EndpointError;
use embassy_usb::Builder;
use heapless::String;
use link_core::{packets, ControlChannel, ControlError, DiagnosticsReport, DIAGNOSTICS_CAPACITY};

/// Max packet size of the CDC data endpoints.
pub const CDC_PACKET_SIZE: u16 = 64;

/// Convert USB endpoint errors to [`ControlError`].
///
/// This is a helper function instead of a `From` impl to avoid orphan rule issues
/// (both `EndpointError` and `ControlError` are defined in external crates).
#[inline]
fn endpoint_error_to_control_error(e: EndpointError) -> ControlError {
    match e {
        EndpointError::Disabled => ControlError::Disconnected,
        EndpointError::BufferOverflow => ControlError::Overflow,
    }
}

/// Receiving half of the serial port as a [`ControlChannel`].
pub struct CdcControlChannel<'d> {
    rx: Receiver<'d, Driver<'d, USB>>,
}

impl<'d> CdcControlChannel<'d> {
    #[must_use]
    pub fn new(rx: Receiver<'d, Driver<'d, USB>>) -> Self {
        Self { rx }
    }

    /// Wait until the host opens the port.
    pub async fn wait_connection(&mut self) {
        self.rx.wait_connection().await;
    }
}

impl<'d> ControlChannel for CdcControlChannel<'d> {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, ControlError> {
        self.rx
            .read_packet(buf)
            .await
            .map_err(endpoint_error_to_control_error)
    }
}

/// Sending half of the serial port, used for the diagnostics lines.
pub struct DiagnosticsWriter<'d> {
    tx: Sender<'d, Driver<'d, USB>>,
}

impl<'d> DiagnosticsWriter<'d> {
    #[must_use]
    pub fn new(tx: Sender<'d, Driver<'d, USB>>) -> Self {
        Self { tx }
    }

    /// Whether a host currently has the port open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.tx.dtr()
    }

    /// Wait until the host opens the port.
    pub async fn wait_connection(&mut self) {
        self.tx.wait_connection().await;
    }

    /// Render `report` and write it out.
    pub async fn write_report(&mut self, report: &DiagnosticsReport) -> Result<(), ControlError> {
        let mut text: String<DIAGNOSTICS_CAPACITY> = String::new();
        write!(text, "{}", report).map_err(|_| ControlError::Overflow)?;
        self.write_text(&text).await
    }

    /// Write `text` as one transfer.
    pub async fn write_text(&mut self, text: &str) -> Result<(), ControlError> {
        for packet in packets(text.as_bytes(), usize::from(CDC_PACKET_SIZE)) {
            self.tx
                .write_packet(packet)
                .await
                .map_err(endpoint_error_to_control_error)?;
        }
        Ok(())
    }
}

/// Configure the CDC-ACM class in the USB builder.
///
/// Returns the control channel and the diagnostics writer.
pub fn configure_usb_serial<'d>(
    builder: &mut Builder<'d, Driver<'d, USB>>,
    state: &'d mut State<'d>,
) -> (CdcControlChannel<'d>, DiagnosticsWriter<'d>) {
    let class = CdcAcmClass::new(builder, state, CDC_PACKET_SIZE);
    let (tx, rx) = class.split();
    (CdcControlChannel::new(rx), DiagnosticsWriter::new(tx))
}
