//! Primary unit of the controller link, for RP2040.
//!
//! Polls the secondary unit over I2C and presents the result to the host as
//! a USB HID gamepad.
//!
//! # Hardware Configuration
//!
//! | Function | GPIO | Description |
//! |----------|------|-------------|
//! | I2C0 SDA | 4    | Link data (external pull-ups recommended) |
//! | I2C0 SCL | 5    | Link clock |
//! | LED      | 25   | Heartbeat: 100 ms healthy, 1000 ms degraded |
//!
//! # Architecture
//!
//! Two Embassy tasks:
//!
//! - **USB Task**: Manages the USB device stack
//! - **Link Task**: One cooperative loop driving [`LinkBridge::step`](link_core::LinkBridge::step)
//!   every millisecond: poll, publish, heartbeat
//!
//! The poll and the USB write are both time-bounded, so a hung bus or a busy
//! host cannot stop the other from running.
//!
//! # Modules
//!
//! - [`i2c_link`]: I2C master link ([`I2cLinkBus`])
//! - [`usb_output`]: USB HID output ([`UsbHidOutput`], [`UsbStateHandler`])
//!
//! # Features
//!
//! - **`dev-panic`** (default): Use `panic-probe` for development (prints panic info via RTT)
//! - **`prod-panic`**: Use `panic-reset` for production (silent watchdog reset)

#![no_std]

pub mod i2c_link;
pub mod usb_output;

pub use i2c_link::I2cLinkBus;
pub use usb_output::{
    configure_usb_hid, GamepadWriter, UsbHidOutput, UsbStateHandler, REPORT_DESCRIPTOR, USB_PID,
    USB_VID,
};
