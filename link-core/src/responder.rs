//! Interrupt-driven bus responder.
//!
//! Serves the [`SnapshotStore`] to the bus master one byte at a time across
//! several hardware events. Every handler is run-to-completion and bounded:
//! it fills or drains a fixed-depth hardware queue and copies one 7-byte
//! record, nothing more.
//!
//! ```text
//!            read requested
//!   Idle ───────────────────────▶ Serving { cursor: 0..=7 }
//!    ▲                                │  tx drained: push more bytes
//!    └────────── stopped ─────────────┘
//! ```
//!
//! The responder must only be driven from one context at a time. The
//! firmware keeps it behind a critical-section mutex that the interrupt
//! handler holds for its whole run.

use link_proto::SNAPSHOT_LEN;

use crate::store::SnapshotStore;

/// Depth of the hardware transmit queue on the RP2040 I2C block.
pub const TX_FIFO_DEPTH: usize = 16;

/// Hardware queues the responder talks to.
pub trait ResponderFifo {
    /// Number of free slots in the transmit queue.
    fn tx_free(&self) -> usize;

    /// Push one byte into the transmit queue. Only called when `tx_free() > 0`.
    fn push_tx(&mut self, byte: u8);

    /// Pop one received byte, if any is queued.
    fn pop_rx(&mut self) -> Option<u8>;
}

/// Events reported by one read of the interrupt status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BusEvents {
    /// The master addressed us for a read.
    pub read_requested: bool,
    /// The transmit queue ran empty.
    pub tx_drained: bool,
    /// The master wrote bytes to us.
    pub byte_received: bool,
    /// STOP condition seen.
    pub stopped: bool,
}

/// Where the responder is in a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ResponderState {
    Idle,
    /// `cursor` bytes of the pending copy have been queued.
    Serving { cursor: usize },
}

/// Event counters, readable from the main loop for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ResponderStats {
    pub read_requests: u32,
    pub rx_events: u32,
    pub rx_bytes: u32,
    pub tx_bytes: u32,
    pub stops: u32,
}

/// Bus responder state machine.
pub struct BusResponder {
    /// Frozen copy of the snapshot for the current read.
    pending: [u8; SNAPSHOT_LEN],
    cursor: usize,
    len: usize,
    stats: ResponderStats,
}

impl BusResponder {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            pending: [0; SNAPSHOT_LEN],
            cursor: 0,
            len: 0,
            stats: ResponderStats {
                read_requests: 0,
                rx_events: 0,
                rx_bytes: 0,
                tx_bytes: 0,
                stops: 0,
            },
        }
    }

    /// Dispatch one batch of events in hardware order: read request, transmit
    /// drain, receive, stop.
    pub fn handle<F: ResponderFifo>(
        &mut self,
        events: BusEvents,
        store: &SnapshotStore,
        fifo: &mut F,
    ) {
        if events.read_requested {
            self.on_read_requested(store, fifo);
        }
        if events.tx_drained {
            self.on_tx_drained(fifo);
        }
        if events.byte_received {
            self.on_byte_received(fifo);
        }
        if events.stopped {
            self.on_stopped();
        }
    }

    /// Start a read: freeze a copy of the snapshot and queue what fits.
    ///
    /// Returns the number of bytes queued.
    pub fn on_read_requested<F: ResponderFifo>(
        &mut self,
        store: &SnapshotStore,
        fifo: &mut F,
    ) -> usize {
        self.stats.read_requests = self.stats.read_requests.wrapping_add(1);
        self.pending = store.load().to_bytes();
        self.cursor = 0;
        self.len = SNAPSHOT_LEN;
        self.fill(fifo)
    }

    /// Queue further bytes of the pending copy. No-op once it is exhausted.
    pub fn on_tx_drained<F: ResponderFifo>(&mut self, fifo: &mut F) -> usize {
        self.fill(fifo)
    }

    /// Drain everything the master wrote. Bytes are counted, never interpreted.
    pub fn on_byte_received<F: ResponderFifo>(&mut self, fifo: &mut F) -> usize {
        self.stats.rx_events = self.stats.rx_events.wrapping_add(1);
        let mut drained = 0;
        while fifo.pop_rx().is_some() {
            drained += 1;
        }
        self.stats.rx_bytes = self.stats.rx_bytes.wrapping_add(drained as u32);
        drained
    }

    /// End of transaction: drop the pending copy and return to idle.
    pub fn on_stopped(&mut self) {
        self.stats.stops = self.stats.stops.wrapping_add(1);
        self.cursor = 0;
        self.len = 0;
    }

    #[must_use]
    pub fn state(&self) -> ResponderState {
        if self.len == 0 {
            ResponderState::Idle
        } else {
            ResponderState::Serving {
                cursor: self.cursor,
            }
        }
    }

    /// Whether bytes of the pending copy are still waiting for queue space.
    #[inline]
    #[must_use]
    pub fn has_pending_tx(&self) -> bool {
        self.cursor < self.len
    }

    #[inline]
    #[must_use]
    pub fn stats(&self) -> ResponderStats {
        self.stats
    }

    fn fill<F: ResponderFifo>(&mut self, fifo: &mut F) -> usize {
        let start = self.cursor;
        while self.cursor < self.len && fifo.tx_free() > 0 {
            fifo.push_tx(self.pending[self.cursor]);
            self.cursor += 1;
        }
        let pushed = self.cursor - start;
        self.stats.tx_bytes = self.stats.tx_bytes.wrapping_add(pushed as u32);
        pushed
    }
}

impl Default for BusResponder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use link_proto::Snapshot;
    use std::collections::VecDeque;
    use std::vec::Vec;

    /// Transmit queue with a configurable number of free slots, plus a
    /// receive queue. Everything pushed is recorded as "on the wire".
    struct MockFifo {
        free: usize,
        wire: Vec<u8>,
        rx: VecDeque<u8>,
    }

    impl MockFifo {
        fn with_free(free: usize) -> Self {
            Self {
                free,
                wire: Vec::new(),
                rx: VecDeque::new(),
            }
        }
    }

    impl ResponderFifo for MockFifo {
        fn tx_free(&self) -> usize {
            self.free
        }

        fn push_tx(&mut self, byte: u8) {
            assert!(self.free > 0, "pushed into a full queue");
            self.free -= 1;
            self.wire.push(byte);
        }

        fn pop_rx(&mut self) -> Option<u8> {
            self.rx.pop_front()
        }
    }

    fn sample() -> Snapshot {
        Snapshot::from_bytes([0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07])
    }

    #[test]
    fn test_read_request_queues_whole_snapshot() {
        let store = SnapshotStore::new(sample());
        let mut responder = BusResponder::new();
        let mut fifo = MockFifo::with_free(TX_FIFO_DEPTH);

        assert_eq!(responder.on_read_requested(&store, &mut fifo), SNAPSHOT_LEN);
        assert_eq!(fifo.wire, sample().to_bytes());
        assert_eq!(responder.state(), ResponderState::Serving { cursor: 7 });
        assert!(!responder.has_pending_tx());

        // Exhausted: further drains do nothing.
        fifo.free = TX_FIFO_DEPTH;
        assert_eq!(responder.on_tx_drained(&mut fifo), 0);
        assert_eq!(fifo.wire.len(), SNAPSHOT_LEN);
    }

    #[test]
    fn test_single_slot_drains_emit_in_order() {
        let store = SnapshotStore::new(sample());
        let mut responder = BusResponder::new();
        let mut fifo = MockFifo::with_free(0);

        assert_eq!(responder.on_read_requested(&store, &mut fifo), 0);
        assert!(responder.has_pending_tx());

        for _ in 0..SNAPSHOT_LEN {
            fifo.free = 1;
            assert_eq!(responder.on_tx_drained(&mut fifo), 1);
        }
        assert_eq!(fifo.wire, sample().to_bytes());

        fifo.free = 1;
        assert_eq!(responder.on_tx_drained(&mut fifo), 0);
        assert_eq!(fifo.wire.len(), SNAPSHOT_LEN);

        // A new read starts over from the first byte.
        fifo.wire.clear();
        fifo.free = TX_FIFO_DEPTH;
        responder.on_stopped();
        responder.on_read_requested(&store, &mut fifo);
        assert_eq!(fifo.wire, sample().to_bytes());
    }

    #[test]
    fn test_partial_queue_defers_remaining_bytes() {
        let store = SnapshotStore::new(sample());
        let mut responder = BusResponder::new();
        let mut fifo = MockFifo::with_free(3);

        assert_eq!(responder.on_read_requested(&store, &mut fifo), 3);
        assert_eq!(responder.state(), ResponderState::Serving { cursor: 3 });

        fifo.free = TX_FIFO_DEPTH;
        assert_eq!(responder.on_tx_drained(&mut fifo), 4);
        assert_eq!(fifo.wire, sample().to_bytes());
    }

    #[test]
    fn test_in_flight_copy_is_frozen() {
        let store = SnapshotStore::new(sample());
        let mut responder = BusResponder::new();
        let mut fifo = MockFifo::with_free(2);

        responder.on_read_requested(&store, &mut fifo);
        store.store(Snapshot::NEUTRAL);

        fifo.free = TX_FIFO_DEPTH;
        responder.on_tx_drained(&mut fifo);
        assert_eq!(fifo.wire, sample().to_bytes());

        // The next transaction sees the new value.
        responder.on_stopped();
        fifo.wire.clear();
        responder.on_read_requested(&store, &mut fifo);
        assert_eq!(fifo.wire, Snapshot::NEUTRAL.to_bytes());
    }

    #[test]
    fn test_received_bytes_are_only_counted() {
        let store = SnapshotStore::new(sample());
        let mut responder = BusResponder::new();
        let mut fifo = MockFifo::with_free(TX_FIFO_DEPTH);
        fifo.rx.extend([0x10, 0xAA, 0xBB]);

        assert_eq!(responder.on_byte_received(&mut fifo), 3);
        assert!(fifo.rx.is_empty());
        assert_eq!(store.load(), sample());
        assert_eq!(responder.state(), ResponderState::Idle);

        let stats = responder.stats();
        assert_eq!(stats.rx_events, 1);
        assert_eq!(stats.rx_bytes, 3);
    }

    #[test]
    fn test_stop_returns_to_idle() {
        let store = SnapshotStore::new(sample());
        let mut responder = BusResponder::new();
        let mut fifo = MockFifo::with_free(2);

        responder.on_read_requested(&store, &mut fifo);
        responder.on_stopped();
        assert_eq!(responder.state(), ResponderState::Idle);

        fifo.free = TX_FIFO_DEPTH;
        assert_eq!(responder.on_tx_drained(&mut fifo), 0);
        assert_eq!(fifo.wire.len(), 2);
    }

    #[test]
    fn test_handle_dispatches_in_hardware_order() {
        let store = SnapshotStore::new(sample());
        let mut responder = BusResponder::new();
        let mut fifo = MockFifo::with_free(TX_FIFO_DEPTH);
        fifo.rx.push_back(0x10);

        // Command write then read request in one interrupt.
        responder.handle(
            BusEvents {
                read_requested: true,
                byte_received: true,
                ..BusEvents::default()
            },
            &store,
            &mut fifo,
        );
        assert_eq!(fifo.wire, sample().to_bytes());

        responder.handle(
            BusEvents {
                stopped: true,
                ..BusEvents::default()
            },
            &store,
            &mut fifo,
        );
        assert_eq!(responder.state(), ResponderState::Idle);

        let stats = responder.stats();
        assert_eq!(stats.read_requests, 1);
        assert_eq!(stats.rx_bytes, 1);
        assert_eq!(stats.tx_bytes, SNAPSHOT_LEN as u32);
        assert_eq!(stats.stops, 1);
    }
}
