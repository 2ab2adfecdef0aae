//! I2C master side of the inter-board link.
//!
//! Wraps any async I2C bus and addresses the secondary unit. Every write and
//! every read is individually bounded; a bus that hangs (for example with the
//! secondary held in reset) surfaces as [`BusError::Timeout`] instead of
//! stalling the main loop.
//!
//! # Pins
//!
//! Uses I2C0 at 100 kHz:
//! - GPIO 4: SDA
//! - GPIO 5: SCL

use embassy_time::{with_timeout, Duration};
use embedded_hal::i2c::{Error as _, ErrorKind};
use embedded_hal_async::i2c::I2c;
use link_core::{BusError, LinkBus};

/// Convert I2C errors to [`BusError`].
///
/// This is a helper function instead of a `From` impl to avoid orphan rule issues
/// (both `ErrorKind` and `BusError` are defined in external crates).
#[inline]
fn i2c_error_to_bus_error(kind: ErrorKind) -> BusError {
    match kind {
        ErrorKind::NoAcknowledge(_) => BusError::Nack,
        _ => BusError::Io,
    }
}

/// Bounded I2C master talking to one target address.
pub struct I2cLinkBus<I> {
    i2c: I,
    address: u8,
    timeout: Duration,
}

impl<I: I2c> I2cLinkBus<I> {
    /// Create a new link bus for the target at `address`.
    #[must_use]
    pub fn new(i2c: I, address: u8, timeout_ms: u32) -> Self {
        Self {
            i2c,
            address,
            timeout: Duration::from_millis(u64::from(timeout_ms)),
        }
    }
}

impl<I: I2c> LinkBus for I2cLinkBus<I> {
    async fn write(&mut self, bytes: &[u8]) -> Result<(), BusError> {
        with_timeout(self.timeout, self.i2c.write(self.address, bytes))
            .await
            .map_err(|_| BusError::Timeout)?
            .map_err(|e| i2c_error_to_bus_error(e.kind()))
    }

    async fn read(&mut self, buf: &mut [u8]) -> Result<(), BusError> {
        with_timeout(self.timeout, self.i2c.read(self.address, buf))
            .await
            .map_err(|_| BusError::Timeout)?
            .map_err(|e| i2c_error_to_bus_error(e.kind()))
    }
}
