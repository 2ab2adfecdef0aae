//! Secondary unit of the controller link, for RP2040.
//!
//! Receives controller snapshots from a host over USB serial and serves the
//! latest one to the primary unit as an I2C target.
//!
//! # Hardware Configuration
//!
//! | Function | GPIO | Description |
//! |----------|------|-------------|
//! | I2C0 SDA | 4    | Link data (target, address 0x55) |
//! | I2C0 SCL | 5    | Link clock |
//! | LED      | 25   | Heartbeat, 500 ms |
//!
//! # Architecture
//!
//! - **`I2C0_IRQ`**: answers read requests from the snapshot store without
//!   waiting on anything (see [`i2c_target`])
//! - **USB Task**: Manages the USB device stack
//! - **Control Task**: Reads frames from the serial port into the snapshot store
//! - **Diagnostics Task**: Writes responder counters and the current snapshot
//!   to the serial port every second
//! - **Heartbeat Task**: Blinks the LED
//!
//! # Modules
//!
//! - [`i2c_target`]: register-level I2C target ([`RegisterFifo`])
//! - [`usb_serial`]: USB CDC-ACM port ([`CdcControlChannel`], [`DiagnosticsWriter`])
//!
//! # Features
//!
//! - **`dev-panic`** (default): Use `panic-probe` for development (prints panic info via RTT)
//! - **`prod-panic`**: Use `panic-reset` for production (silent watchdog reset)

#![no_std]

pub mod i2c_target;
pub mod usb_serial;

pub use i2c_target::RegisterFifo;
pub use usb_serial::{configure_usb_serial, CdcControlChannel, DiagnosticsWriter, CDC_PACKET_SIZE};
