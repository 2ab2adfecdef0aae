//! Primary-side bus poller.
//!
//! One poll is two bounded bus operations: write the GET command, then read
//! the 7 snapshot bytes. Failures are not retried; the next poll tick is the
//! retry. The report state only changes after a complete, successful read.

use core::future::Future;

use link_proto::{Snapshot, CMD_GET, SNAPSHOT_LEN};

use crate::cadence::LinkHealth;

/// Error type for bus operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusError {
    /// The operation did not finish within its bound.
    Timeout,
    /// The secondary did not acknowledge.
    Nack,
    /// Any other bus fault (arbitration loss, bus error, ...).
    Io,
}

/// Async trait for the master side of the inter-board bus.
///
/// Implementations address the secondary unit themselves and must bound
/// every call by the configured timeout.
///
/// # `no_std` Compatibility
///
/// All implementations must be `#![no_std]` compatible with no heap allocation.
pub trait LinkBus {
    /// Write `bytes` to the secondary in one transaction.
    fn write(&mut self, bytes: &[u8]) -> impl Future<Output = Result<(), BusError>>;

    /// Read exactly `buf.len()` bytes from the secondary in one transaction.
    fn read(&mut self, buf: &mut [u8]) -> impl Future<Output = Result<(), BusError>>;
}

/// The last successfully polled snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ReportState {
    snapshot: Snapshot,
    updates: u32,
}

impl ReportState {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            snapshot: Snapshot::NEUTRAL,
            updates: 0,
        }
    }

    #[inline]
    #[must_use]
    pub const fn snapshot(&self) -> Snapshot {
        self.snapshot
    }

    /// Number of successful polls folded in so far.
    #[inline]
    #[must_use]
    pub const fn updates(&self) -> u32 {
        self.updates
    }

    fn update(&mut self, snapshot: Snapshot) {
        self.snapshot = snapshot;
        self.updates = self.updates.wrapping_add(1);
    }
}

impl Default for ReportState {
    fn default() -> Self {
        Self::new()
    }
}

/// Poll outcome counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PollStats {
    pub ok: u32,
    pub timeouts: u32,
    pub nacks: u32,
    pub io_errors: u32,
}

impl PollStats {
    fn record(&mut self, result: &Result<Snapshot, BusError>) {
        let counter = match result {
            Ok(_) => &mut self.ok,
            Err(BusError::Timeout) => &mut self.timeouts,
            Err(BusError::Nack) => &mut self.nacks,
            Err(BusError::Io) => &mut self.io_errors,
        };
        *counter = counter.wrapping_add(1);
    }
}

/// Issues GET/read transactions and keeps the [`ReportState`].
pub struct BusPoller<B> {
    bus: B,
    report: ReportState,
    stats: PollStats,
}

impl<B: LinkBus> BusPoller<B> {
    pub fn new(bus: B) -> Self {
        Self {
            bus,
            report: ReportState::new(),
            stats: PollStats::default(),
        }
    }

    /// Run one poll. On failure the report state keeps its previous value.
    pub async fn poll(&mut self) -> Result<Snapshot, BusError> {
        let result = self.transact().await;
        self.stats.record(&result);
        if let Ok(snapshot) = result {
            self.report.update(snapshot);
        }
        result
    }

    async fn transact(&mut self) -> Result<Snapshot, BusError> {
        self.bus.write(&[CMD_GET]).await?;
        let mut buf = [0u8; SNAPSHOT_LEN];
        self.bus.read(&mut buf).await?;
        Ok(Snapshot::from_bytes(buf))
    }

    #[inline]
    #[must_use]
    pub fn report(&self) -> &ReportState {
        &self.report
    }

    #[inline]
    #[must_use]
    pub fn stats(&self) -> PollStats {
        self.stats
    }

    /// Get a reference to the bus.
    pub fn bus(&self) -> &B {
        &self.bus
    }

    /// Get a mutable reference to the bus.
    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    /// Give the bus back.
    pub fn into_bus(self) -> B {
        self.bus
    }
}

/// Health implied by a poll result.
#[must_use]
pub fn health_of<T>(result: &Result<T, BusError>) -> LinkHealth {
    match result {
        Ok(_) => LinkHealth::Healthy,
        Err(_) => LinkHealth::Degraded,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    extern crate std;

    use super::*;
    use crate::test_util::block_on;
    use std::vec::Vec;

    /// Scripted bus: each call pops the next result. Reads fill the buffer
    /// with `reply` on success.
    pub(crate) struct MockBus {
        pub writes: Vec<Result<(), BusError>>,
        pub reads: Vec<Result<(), BusError>>,
        pub reply: [u8; SNAPSHOT_LEN],
        pub written: Vec<u8>,
        pub read_calls: usize,
    }

    impl MockBus {
        pub(crate) fn answering(reply: [u8; SNAPSHOT_LEN]) -> Self {
            Self {
                writes: Vec::new(),
                reads: Vec::new(),
                reply,
                written: Vec::new(),
                read_calls: 0,
            }
        }

        pub(crate) fn failing(write: BusError) -> Self {
            let mut bus = Self::answering([0; SNAPSHOT_LEN]);
            bus.writes = std::vec![Err(write); 64];
            bus
        }
    }

    impl LinkBus for MockBus {
        fn write(&mut self, bytes: &[u8]) -> impl Future<Output = Result<(), BusError>> {
            let result = if self.writes.is_empty() {
                Ok(())
            } else {
                self.writes.remove(0)
            };
            if result.is_ok() {
                self.written.extend_from_slice(bytes);
            }
            core::future::ready(result)
        }

        fn read(&mut self, buf: &mut [u8]) -> impl Future<Output = Result<(), BusError>> {
            self.read_calls += 1;
            let result = if self.reads.is_empty() {
                Ok(())
            } else {
                self.reads.remove(0)
            };
            if result.is_ok() {
                buf.copy_from_slice(&self.reply);
            }
            core::future::ready(result)
        }
    }

    #[test]
    fn test_successful_poll_updates_report() {
        let reply = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07];
        let mut poller = BusPoller::new(MockBus::answering(reply));

        let result = block_on(poller.poll());
        assert_eq!(result, Ok(Snapshot::from_bytes(reply)));
        assert_eq!(poller.report().snapshot(), Snapshot::from_bytes(reply));
        assert_eq!(poller.report().updates(), 1);
        assert_eq!(poller.bus().written, std::vec![CMD_GET]);
        assert_eq!(health_of(&result), LinkHealth::Healthy);
    }

    #[test]
    fn test_unacknowledged_command_skips_read() {
        let mut poller = BusPoller::new(MockBus::failing(BusError::Nack));

        let result = block_on(poller.poll());
        assert_eq!(result, Err(BusError::Nack));
        assert_eq!(poller.bus().read_calls, 0);
        assert_eq!(poller.report().snapshot(), Snapshot::NEUTRAL);
        assert_eq!(poller.stats().nacks, 1);
    }

    #[test]
    fn test_timeout_keeps_stale_report() {
        let reply = [9, 9, 9, 9, 9, 9, 9];
        let mut poller = BusPoller::new(MockBus::answering(reply));
        block_on(poller.poll()).unwrap();

        poller.bus_mut().reads.push(Err(BusError::Timeout));
        poller.bus_mut().reply = [0; SNAPSHOT_LEN];
        let result = block_on(poller.poll());

        assert_eq!(result, Err(BusError::Timeout));
        assert_eq!(poller.report().snapshot(), Snapshot::from_bytes(reply));
        assert_eq!(poller.report().updates(), 1);
        assert_eq!(health_of(&result), LinkHealth::Degraded);

        let stats = poller.stats();
        assert_eq!(stats.ok, 1);
        assert_eq!(stats.timeouts, 1);
    }
}
