//! Report publisher: turns the report state into the USB gamepad report.
//!
//! Reports are level-triggered: one is offered every publish period whether
//! or not the state changed. If the host side is not ready the cycle is
//! skipped, nothing is queued.

use core::future::Future;

use link_proto::{Snapshot, SNAPSHOT_LEN};
use portable_atomic::{AtomicBool, Ordering};

use crate::cadence::Cadence;
use crate::poller::ReportState;

/// Error type for output operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OutputError {
    /// USB/communication I/O error.
    Io,
    /// Device not ready (e.g., USB not enumerated).
    NotReady,
    /// Endpoint busy for longer than one publish period.
    Busy,
}

/// USB HID gamepad report.
///
/// The 7 snapshot bytes followed by one constant filler byte, 8 bytes total.
/// This matches the report descriptor: 14 buttons + 2 padding bits, a 4-bit
/// hat + 4 padding bits, four 8-bit axes and one constant byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GamepadReport {
    pub snapshot: Snapshot,
}

impl GamepadReport {
    /// Size of the report in bytes.
    pub const SIZE: usize = SNAPSHOT_LEN + 1;

    /// Convert the report to bytes.
    #[must_use]
    pub fn as_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[..SNAPSHOT_LEN].copy_from_slice(&self.snapshot.to_bytes());
        bytes
    }
}

impl From<&ReportState> for GamepadReport {
    fn from(state: &ReportState) -> Self {
        Self {
            snapshot: state.snapshot(),
        }
    }
}

/// Async trait for gamepad report sinks.
///
/// # `no_std` Compatibility
///
/// All implementations must be `#![no_std]` compatible with no heap allocation.
pub trait ReportSink {
    /// Send one report. Must not wait longer than one publish period.
    fn send(&mut self, report: &GamepadReport) -> impl Future<Output = Result<(), OutputError>>;

    /// Check if the host side currently accepts reports.
    fn is_ready(&self) -> bool;
}

/// Host-side USB device state, written by the USB stack and read by the sink.
///
/// Configuration and suspension are tracked apart: a resume does not repeat
/// SET_CONFIGURATION, so the device is ready again as soon as it wakes.
pub struct UsbLinkState {
    configured: AtomicBool,
    suspended: AtomicBool,
}

impl UsbLinkState {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            configured: AtomicBool::new(false),
            suspended: AtomicBool::new(false),
        }
    }

    pub fn set_configured(&self, configured: bool) {
        self.configured.store(configured, Ordering::Release);
    }

    pub fn set_suspended(&self, suspended: bool) {
        self.suspended.store(suspended, Ordering::Release);
    }

    /// Bus reset: the host has to enumerate the device again.
    pub fn reset(&self) {
        self.configured.store(false, Ordering::Release);
        self.suspended.store(false, Ordering::Release);
    }

    /// Configured and awake.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.configured.load(Ordering::Acquire) && !self.suspended.load(Ordering::Acquire)
    }
}

impl Default for UsbLinkState {
    fn default() -> Self {
        Self::new()
    }
}

/// What one publisher tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PublishOutcome {
    /// Not due yet.
    Idle,
    Sent,
    /// Due, but the sink was not ready.
    Skipped,
    Failed(OutputError),
}

/// Publisher counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PublishStats {
    pub sent: u32,
    pub skipped: u32,
    pub failed: u32,
}

/// Sends the report on a fixed cadence.
pub struct ReportPublisher {
    cadence: Cadence,
    stats: PublishStats,
}

impl ReportPublisher {
    #[must_use]
    pub const fn new(period_ms: u32) -> Self {
        Self {
            cadence: Cadence::new(period_ms),
            stats: PublishStats {
                sent: 0,
                skipped: 0,
                failed: 0,
            },
        }
    }

    /// Offer the current report to `sink` if a period has passed.
    pub async fn tick<S: ReportSink>(
        &mut self,
        now_ms: u32,
        state: &ReportState,
        sink: &mut S,
    ) -> PublishOutcome {
        if !self.cadence.due(now_ms) {
            return PublishOutcome::Idle;
        }

        if !sink.is_ready() {
            self.stats.skipped = self.stats.skipped.wrapping_add(1);
            return PublishOutcome::Skipped;
        }

        match sink.send(&GamepadReport::from(state)).await {
            Ok(()) => {
                self.stats.sent = self.stats.sent.wrapping_add(1);
                PublishOutcome::Sent
            }
            Err(e) => {
                self.stats.failed = self.stats.failed.wrapping_add(1);
                PublishOutcome::Failed(e)
            }
        }
    }

    #[inline]
    #[must_use]
    pub fn stats(&self) -> PublishStats {
        self.stats
    }
}
