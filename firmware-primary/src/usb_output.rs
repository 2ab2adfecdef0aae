//! USB HID gamepad output implementation.

use embassy_rp::peripherals::USB;
use embassy_rp::usb::Driver;
use embassy_time::{with_timeout, Duration};
use embassy_usb::class::hid::{HidWriter, State};
use embassy_usb::driver::EndpointError;
use embassy_usb::{Builder, Handler};
use link_core::{GamepadReport, OutputError, ReportSink, UsbLinkState};

/// HID writer type for the 8-byte gamepad report.
pub type GamepadWriter<'d> = HidWriter<'d, Driver<'d, USB>, { GamepadReport::SIZE }>;

/// Vendor/product IDs the host sees (a licensed Switch-compatible pad).
pub const USB_VID: u16 = 0x0f0d;
pub const USB_PID: u16 = 0x00c1;

/// Switch-compatible HID gamepad report descriptor.
///
/// This descriptor defines a gamepad with:
/// - 14 buttons + 2 constant padding bits
/// - 1 hat switch (4 bits, values 0-7, anything else is null) + 4 padding bits
/// - 4 axes (X, Y, Z, Rz), unsigned 8-bit
/// - 1 constant byte
pub const REPORT_DESCRIPTOR: &[u8] = &[
    0x05, 0x01, // Usage Page (Generic Desktop)
    0x09, 0x05, // Usage (Gamepad)
    0xA1, 0x01, // Collection (Application)
    //
    // --- Buttons (14 buttons) ---
    0x15, 0x00, //   Logical Minimum (0)
    0x25, 0x01, //   Logical Maximum (1)
    0x35, 0x00, //   Physical Minimum (0)
    0x45, 0x01, //   Physical Maximum (1)
    0x75, 0x01, //   Report Size (1)
    0x95, 0x0E, //   Report Count (14)
    0x05, 0x09, //   Usage Page (Button)
    0x19, 0x01, //   Usage Minimum (Button 1)
    0x29, 0x0E, //   Usage Maximum (Button 14)
    0x81, 0x02, //   Input (Data, Variable, Absolute)
    0x95, 0x02, //   Report Count (2)
    0x81, 0x01, //   Input (Constant)
    //
    // --- Hat switch ---
    0x05, 0x01, //   Usage Page (Generic Desktop)
    0x25, 0x07, //   Logical Maximum (7)
    0x46, 0x3B, 0x01, //   Physical Maximum (315)
    0x75, 0x04, //   Report Size (4)
    0x95, 0x01, //   Report Count (1)
    0x65, 0x14, //   Unit (English Rotation, Degrees)
    0x09, 0x39, //   Usage (Hat Switch)
    0x81, 0x42, //   Input (Data, Variable, Absolute, Null State)
    0x65, 0x00, //   Unit (None)
    0x95, 0x01, //   Report Count (1)
    0x81, 0x01, //   Input (Constant)
    //
    // --- Sticks ---
    0x26, 0xFF, 0x00, //   Logical Maximum (255)
    0x46, 0xFF, 0x00, //   Physical Maximum (255)
    0x09, 0x30, //   Usage (X)
    0x09, 0x31, //   Usage (Y)
    0x09, 0x32, //   Usage (Z)
    0x09, 0x35, //   Usage (Rz)
    0x75, 0x08, //   Report Size (8)
    0x95, 0x04, //   Report Count (4)
    0x81, 0x02, //   Input (Data, Variable, Absolute)
    //
    // --- Filler ---
    0x75, 0x08, //   Report Size (8)
    0x95, 0x01, //   Report Count (1)
    0x81, 0x01, //   Input (Constant)
    //
    0xC0, // End Collection
];

/// Feeds device state changes from the USB stack into a [`UsbLinkState`].
///
/// Registered with the USB builder; the state is read by [`UsbHidOutput::is_ready`].
pub struct UsbStateHandler {
    state: &'static UsbLinkState,
}

impl UsbStateHandler {
    #[must_use]
    pub fn new(state: &'static UsbLinkState) -> Self {
        Self { state }
    }
}

impl Handler for UsbStateHandler {
    fn configured(&mut self, configured: bool) {
        self.state.set_configured(configured);
        if configured {
            defmt::info!("USB configured");
        } else {
            defmt::info!("USB unconfigured");
        }
    }

    fn suspended(&mut self, suspended: bool) {
        self.state.set_suspended(suspended);
        if suspended {
            defmt::info!("USB suspended");
        } else {
            defmt::info!("USB resumed");
        }
    }

    fn reset(&mut self) {
        self.state.reset();
    }
}

/// USB HID gamepad output.
///
/// Wraps an embassy-usb HID writer to send gamepad reports. A write that
/// does not complete within `write_timeout` is abandoned and reported as
/// [`OutputError::Busy`].
pub struct UsbHidOutput<'d> {
    writer: GamepadWriter<'d>,
    usb: &'d UsbLinkState,
    write_timeout: Duration,
}

impl<'d> UsbHidOutput<'d> {
    /// Create a new USB HID output from the given HID writer.
    pub fn new(writer: GamepadWriter<'d>, usb: &'d UsbLinkState, write_timeout_ms: u32) -> Self {
        Self {
            writer,
            usb,
            write_timeout: Duration::from_millis(u64::from(write_timeout_ms)),
        }
    }
}

impl<'d> ReportSink for UsbHidOutput<'d> {
    async fn send(&mut self, report: &GamepadReport) -> Result<(), OutputError> {
        match with_timeout(self.write_timeout, self.writer.write(&report.as_bytes())).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(EndpointError::Disabled)) => Err(OutputError::NotReady),
            Ok(Err(_)) => Err(OutputError::Io),
            Err(_) => Err(OutputError::Busy),
        }
    }

    fn is_ready(&self) -> bool {
        self.usb.is_ready()
    }
}

/// Configure the USB HID class in the USB builder.
///
/// Returns the HID writer for use by the application.
pub fn configure_usb_hid<'d>(
    builder: &mut Builder<'d, Driver<'d, USB>>,
    state: &'d mut State<'d>,
    poll_ms: u8,
) -> GamepadWriter<'d> {
    let config = embassy_usb::class::hid::Config {
        report_descriptor: REPORT_DESCRIPTOR,
        request_handler: None,
        poll_ms,
        max_packet_size: GamepadReport::SIZE as u16,
        hid_subclass: embassy_usb::class::hid::HidSubclass::No,
        hid_boot_protocol: embassy_usb::class::hid::HidBootProtocol::None,
    };

    HidWriter::new(builder, state, config)
}
