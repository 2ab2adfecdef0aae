//! Secondary-side control channel pump.
//!
//! Bytes arrive from the host in arbitrary chunks. Each byte goes through the
//! [`FrameParser`]; every accepted frame replaces the stored snapshot.

use core::future::Future;

use link_proto::{FrameOutcome, FrameParser, FrameStats};

use crate::store::SnapshotStore;

/// Largest chunk read from the channel in one call.
pub const CONTROL_CHUNK: usize = 64;

/// Error type for control channel reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ControlError {
    /// Host closed the port or the device was unplugged.
    Disconnected,
    /// More data arrived than the read buffer holds.
    Overflow,
    /// Any other transport error.
    Io,
}

/// Async trait for byte sources carrying control frames.
///
/// # `no_std` Compatibility
///
/// All implementations must be `#![no_std]` compatible with no heap allocation.
pub trait ControlChannel {
    /// Read up to `buf.len()` bytes. Returns the number of bytes read.
    fn read(&mut self, buf: &mut [u8]) -> impl Future<Output = Result<usize, ControlError>>;
}

/// Moves bytes from a [`ControlChannel`] into a [`SnapshotStore`].
pub struct ControlLink<'a, C> {
    channel: C,
    parser: FrameParser,
    store: &'a SnapshotStore,
}

impl<'a, C: ControlChannel> ControlLink<'a, C> {
    pub fn new(channel: C, store: &'a SnapshotStore) -> Self {
        Self {
            channel,
            parser: FrameParser::new(),
            store,
        }
    }

    /// Read one chunk and process it. Returns the number of frames stored.
    pub async fn pump(&mut self) -> Result<usize, ControlError> {
        let mut buf = [0u8; CONTROL_CHUNK];
        let n = self.channel.read(&mut buf).await?;
        Ok(self.ingest(&buf[..n]))
    }

    /// Feed already-received bytes. Returns the number of frames stored.
    pub fn ingest(&mut self, bytes: &[u8]) -> usize {
        let mut stored = 0;
        for &byte in bytes {
            if let FrameOutcome::Accepted(snapshot) = self.parser.feed(byte) {
                self.store.store(snapshot);
                stored += 1;
            }
        }
        stored
    }

    #[inline]
    #[must_use]
    pub fn parser_stats(&self) -> FrameStats {
        self.parser.stats()
    }

    /// Drop any partial frame, e.g. after the host reconnects.
    pub fn reset(&mut self) {
        self.parser.clear();
    }

    /// Get a mutable reference to the channel.
    pub fn channel_mut(&mut self) -> &mut C {
        &mut self.channel
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::test_util::block_on;
    use link_proto::{Buttons, Snapshot, SnapshotBuilder};
    use std::collections::VecDeque;
    use std::vec::Vec;

    struct MockChannel {
        chunks: VecDeque<Result<Vec<u8>, ControlError>>,
    }

    impl MockChannel {
        fn new(chunks: &[&[u8]]) -> Self {
            Self {
                chunks: chunks.iter().map(|c| Ok(c.to_vec())).collect(),
            }
        }
    }

    impl ControlChannel for MockChannel {
        fn read(&mut self, buf: &mut [u8]) -> impl Future<Output = Result<usize, ControlError>> {
            let result = match self.chunks.pop_front() {
                Some(Ok(chunk)) => {
                    buf[..chunk.len()].copy_from_slice(&chunk);
                    Ok(chunk.len())
                }
                Some(Err(e)) => Err(e),
                None => Err(ControlError::Disconnected),
            };
            core::future::ready(result)
        }
    }

    #[test]
    fn test_reference_frame_updates_store() {
        let store = SnapshotStore::default();
        let frame = [
            0x55, 0xAA, 0x04, 0x00, 0x0F, 0x80, 0x80, 0x80, 0x80, 0x0D, 0x0A,
        ];
        let mut link = ControlLink::new(MockChannel::new(&[&frame]), &store);

        assert_eq!(block_on(link.pump()), Ok(1));
        let snapshot = store.load();
        assert_eq!(snapshot.to_bytes(), [0x04, 0x00, 0x0F, 0x80, 0x80, 0x80, 0x80]);
        assert!(snapshot.buttons.contains(Buttons::A));
    }

    #[test]
    fn test_frame_split_across_reads() {
        let store = SnapshotStore::default();
        let frame = SnapshotBuilder::new().press(Buttons::HOME).frame();
        let mut link = ControlLink::new(MockChannel::new(&[&frame[..4], &frame[4..]]), &store);

        assert_eq!(block_on(link.pump()), Ok(0));
        assert_eq!(store.load(), Snapshot::NEUTRAL);
        assert_eq!(block_on(link.pump()), Ok(1));
        assert!(store.load().buttons.contains(Buttons::HOME));
    }

    #[test]
    fn test_malformed_frame_leaves_store_unchanged() {
        let store = SnapshotStore::default();
        let short = [0x55, 0xAA, 0x01, 0x02, 0x03, 0x0D, 0x0A];
        let mut link = ControlLink::new(MockChannel::new(&[&short]), &store);

        assert_eq!(block_on(link.pump()), Ok(0));
        assert_eq!(store.load(), Snapshot::NEUTRAL);
        assert_eq!(link.parser_stats().malformed, 1);
    }

    #[test]
    fn test_last_frame_in_chunk_wins() {
        let store = SnapshotStore::default();
        let first = SnapshotBuilder::new().press(Buttons::A).frame();
        let second = SnapshotBuilder::new().press(Buttons::B).frame();
        let mut chunk = Vec::new();
        chunk.extend_from_slice(&first);
        chunk.extend_from_slice(&second);
        let mut link = ControlLink::new(MockChannel::new(&[&chunk]), &store);

        assert_eq!(block_on(link.pump()), Ok(2));
        assert_eq!(store.load().buttons, Buttons::B);
    }

    #[test]
    fn test_disconnect_is_reported() {
        let store = SnapshotStore::default();
        let mut link = ControlLink::new(MockChannel::new(&[]), &store);
        assert_eq!(block_on(link.pump()), Err(ControlError::Disconnected));
    }
}
