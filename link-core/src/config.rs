//! Compile-time link configuration.

use link_proto::{BUS_FREQUENCY_HZ, BUS_TIMEOUT_MS, PERIPHERAL_ADDRESS};

/// Timing and addressing shared by both units.
///
/// All periods are in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LinkConfig {
    /// 7-bit bus address of the secondary unit.
    pub address: u8,
    /// Bus clock in Hz.
    pub bus_frequency_hz: u32,
    /// How often the primary polls the secondary.
    pub poll_period_ms: u32,
    /// Bound on each write and each read phase of a poll.
    pub bus_timeout_ms: u32,
    /// How often the USB report is sent.
    pub publish_period_ms: u32,
    /// Heartbeat period while polls succeed.
    pub healthy_blink_ms: u32,
    /// Heartbeat period after a failed poll.
    pub degraded_blink_ms: u32,
    /// Heartbeat period on the secondary unit.
    pub secondary_blink_ms: u32,
    /// How often the secondary writes its counters to the side channel.
    pub diagnostics_period_ms: u32,
}

impl LinkConfig {
    pub const DEFAULT: Self = Self {
        address: PERIPHERAL_ADDRESS,
        bus_frequency_hz: BUS_FREQUENCY_HZ,
        poll_period_ms: 10,
        bus_timeout_ms: BUS_TIMEOUT_MS,
        publish_period_ms: 10,
        healthy_blink_ms: 100,
        degraded_blink_ms: 1000,
        secondary_blink_ms: 500,
        diagnostics_period_ms: 1000,
    };

    /// HID endpoint polling interval for the publish period.
    ///
    /// A full-speed interrupt endpoint takes 1..=255 ms, so the period is
    /// clamped into that range instead of truncated.
    #[must_use]
    pub const fn hid_poll_ms(&self) -> u8 {
        if self.publish_period_ms == 0 {
            1
        } else if self.publish_period_ms > u8::MAX as u32 {
            u8::MAX
        } else {
            self.publish_period_ms as u8
        }
    }
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_poll_interval_is_publish_period() {
        assert_eq!(LinkConfig::DEFAULT.hid_poll_ms(), 10);
    }

    #[test]
    fn test_poll_interval_clamps_instead_of_truncating() {
        let slow = LinkConfig {
            publish_period_ms: 300,
            ..LinkConfig::DEFAULT
        };
        assert_eq!(slow.hid_poll_ms(), 255);

        let zero = LinkConfig {
            publish_period_ms: 0,
            ..LinkConfig::DEFAULT
        };
        assert_eq!(zero.hid_poll_ms(), 1);
    }
}
