//! Control-channel framing.
//!
//! A frame is a start marker, exactly [`SNAPSHOT_LEN`] payload bytes and an
//! end marker:
//!
//! ```text
//! 55 AA <buttons lo> <buttons hi> <dpad> <lx> <ly> <rx> <ry> 0D 0A
//! ```
//!
//! There is no escaping and no checksum. The parser takes the first start
//! marker in its buffer and the first end marker after it, so a payload that
//! itself contains `0D 0A` is mis-framed. That matches what existing senders
//! expect and is kept as-is.

use heapless::Vec;

use crate::types::{Snapshot, SNAPSHOT_LEN};

/// Marker that opens a frame.
pub const START_MARKER: [u8; 2] = [0x55, 0xAA];

/// Marker that closes a frame.
pub const END_MARKER: [u8; 2] = [0x0D, 0x0A];

/// Length of a well-formed frame on the wire.
pub const FRAME_LEN: usize = START_MARKER.len() + SNAPSHOT_LEN + END_MARKER.len();

/// Capacity of the inbound assembly buffer.
pub const ASSEMBLY_CAPACITY: usize = 16;

/// Error returned when encoding a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EncodeError {
    /// Output buffer shorter than [`FRAME_LEN`].
    BufferTooSmall,
}

/// Result of one extraction attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameOutcome {
    /// No complete frame in the buffer yet.
    Pending,
    /// A frame with a 7-byte payload was found.
    Accepted(Snapshot),
    /// A frame was found but its payload had the wrong length; it was dropped.
    Malformed {
        /// Number of bytes between the markers.
        len: usize,
    },
}

/// Counters kept by [`FrameParser`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FrameStats {
    /// Frames that produced a snapshot.
    pub accepted: u32,
    /// Frames dropped for a payload length other than 7.
    pub malformed: u32,
    /// Bytes lost because the assembly buffer was full.
    pub overwritten: u32,
}

/// Byte-at-a-time frame parser with a bounded assembly buffer.
///
/// When the buffer is full the oldest byte is dropped to make room; the
/// byte source never sees backpressure.
pub struct FrameParser {
    buffer: Vec<u8, ASSEMBLY_CAPACITY>,
    stats: FrameStats,
}

impl FrameParser {
    /// Create an empty parser.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            buffer: Vec::new(),
            stats: FrameStats {
                accepted: 0,
                malformed: 0,
                overwritten: 0,
            },
        }
    }

    /// Append one byte and process at most one frame.
    pub fn feed(&mut self, byte: u8) -> FrameOutcome {
        self.push_byte(byte);
        self.try_extract()
    }

    /// Append one byte without looking for frames.
    pub fn push_byte(&mut self, byte: u8) {
        if self.buffer.is_full() {
            self.buffer.remove(0);
            self.stats.overwritten = self.stats.overwritten.wrapping_add(1);
        }
        let pushed = self.buffer.push(byte).is_ok();
        debug_assert!(pushed, "no free slot after dropping the oldest byte");
    }

    /// Look for one complete frame and remove it from the buffer.
    ///
    /// Everything up to and including the end marker is discarded, whether
    /// the payload was accepted or not. Any further buffered frames are left
    /// for the next call.
    pub fn try_extract(&mut self) -> FrameOutcome {
        let Some((start, end)) = locate_frame(&self.buffer) else {
            return FrameOutcome::Pending;
        };

        let payload_start = start + START_MARKER.len();
        let snapshot = Snapshot::from_slice(&self.buffer[payload_start..end]);
        let outcome = match snapshot {
            Some(snapshot) => {
                self.stats.accepted = self.stats.accepted.wrapping_add(1);
                FrameOutcome::Accepted(snapshot)
            }
            None => {
                self.stats.malformed = self.stats.malformed.wrapping_add(1);
                FrameOutcome::Malformed {
                    len: end - payload_start,
                }
            }
        };

        self.consume(end + END_MARKER.len());
        outcome
    }

    /// Bytes currently waiting in the assembly buffer.
    #[inline]
    #[must_use]
    pub fn buffered(&self) -> &[u8] {
        &self.buffer
    }

    #[inline]
    #[must_use]
    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    /// Drop all buffered bytes. Counters are kept.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// Compact the buffer by removing the first `count` bytes.
    fn consume(&mut self, count: usize) {
        let remaining = self.buffer.len() - count;
        self.buffer.copy_within(count.., 0);
        self.buffer.truncate(remaining);
    }
}

impl Default for FrameParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Find the first start marker and the first end marker after it.
///
/// Returns `(start, end)` where `start` indexes the start marker and `end`
/// indexes the end marker.
fn locate_frame(buffer: &[u8]) -> Option<(usize, usize)> {
    let start = buffer.windows(2).position(|w| w == START_MARKER)?;
    let search_from = start + START_MARKER.len();
    let end = buffer[search_from..]
        .windows(2)
        .position(|w| w == END_MARKER)?;
    Some((start, search_from + end))
}

/// Write `snapshot` as a complete frame into `buf`.
///
/// Returns the number of bytes written (always [`FRAME_LEN`]).
pub fn encode_frame(snapshot: &Snapshot, buf: &mut [u8]) -> Result<usize, EncodeError> {
    let out = buf
        .get_mut(..FRAME_LEN)
        .ok_or(EncodeError::BufferTooSmall)?;
    out.copy_from_slice(&snapshot.to_frame());
    Ok(FRAME_LEN)
}

impl Snapshot {
    /// This snapshot as a complete control-channel frame.
    #[must_use]
    pub fn to_frame(&self) -> [u8; FRAME_LEN] {
        let mut frame = [0u8; FRAME_LEN];
        frame[..2].copy_from_slice(&START_MARKER);
        frame[2..2 + SNAPSHOT_LEN].copy_from_slice(&self.to_bytes());
        frame[FRAME_LEN - 2..].copy_from_slice(&END_MARKER);
        frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Buttons;

    fn feed_all(parser: &mut FrameParser, bytes: &[u8]) -> FrameOutcome {
        let mut last = FrameOutcome::Pending;
        for &b in bytes {
            match parser.feed(b) {
                FrameOutcome::Pending => {}
                outcome => last = outcome,
            }
        }
        last
    }

    #[test]
    fn test_parse_reference_frame() {
        let mut parser = FrameParser::new();
        let outcome = feed_all(
            &mut parser,
            &[0x55, 0xAA, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x0D, 0x0A],
        );

        let FrameOutcome::Accepted(snapshot) = outcome else {
            panic!("expected a snapshot, got {:?}", outcome);
        };
        assert_eq!(snapshot.buttons, Buttons(0x0201));
        assert_eq!(snapshot.dpad, 0x03);
        assert_eq!(snapshot.left_x, 0x04);
        assert_eq!(snapshot.left_y, 0x05);
        assert_eq!(snapshot.right_x, 0x06);
        assert_eq!(snapshot.right_y, 0x07);
        assert!(parser.buffered().is_empty());
    }

    #[test]
    fn test_frame_is_pending_until_end_marker() {
        let mut parser = FrameParser::new();
        let frame = Snapshot::NEUTRAL.to_frame();
        for &b in &frame[..FRAME_LEN - 1] {
            assert_eq!(parser.feed(b), FrameOutcome::Pending);
        }
        assert_eq!(
            parser.feed(frame[FRAME_LEN - 1]),
            FrameOutcome::Accepted(Snapshot::NEUTRAL)
        );
    }

    #[test]
    fn test_short_payload_is_dropped() {
        let mut parser = FrameParser::new();
        let outcome = feed_all(&mut parser, &[0x55, 0xAA, 0x01, 0x02, 0x03, 0x0D, 0x0A]);
        assert_eq!(outcome, FrameOutcome::Malformed { len: 3 });
        assert!(parser.buffered().is_empty());
        assert_eq!(parser.stats().malformed, 1);
        assert_eq!(parser.stats().accepted, 0);
    }

    #[test]
    fn test_leading_garbage_is_discarded_with_frame() {
        let mut parser = FrameParser::new();
        let mut bytes = [0u8; 3 + FRAME_LEN];
        bytes[..3].copy_from_slice(&[0x00, 0x55, 0x13]);
        bytes[3..].copy_from_slice(&Snapshot::NEUTRAL.to_frame());

        assert_eq!(
            feed_all(&mut parser, &bytes),
            FrameOutcome::Accepted(Snapshot::NEUTRAL)
        );
        assert!(parser.buffered().is_empty());
    }

    #[test]
    fn test_one_frame_per_extraction() {
        let mut parser = FrameParser::new();
        let first = Snapshot::from_bytes([1, 0, 0, 1, 1, 1, 1]);
        let frame = first.to_frame();
        for &b in &frame {
            parser.push_byte(b);
        }
        for &b in &[0x55, 0xAA, 0x0D, 0x0A] {
            parser.push_byte(b);
        }

        assert_eq!(parser.try_extract(), FrameOutcome::Accepted(first));
        assert_eq!(parser.try_extract(), FrameOutcome::Malformed { len: 0 });
        assert_eq!(parser.try_extract(), FrameOutcome::Pending);
    }

    #[test]
    fn test_full_buffer_drops_oldest_bytes() {
        let mut parser = FrameParser::new();
        for b in 0..ASSEMBLY_CAPACITY as u8 {
            assert_eq!(parser.feed(b), FrameOutcome::Pending);
        }
        assert_eq!(parser.buffered().len(), ASSEMBLY_CAPACITY);

        assert_eq!(parser.feed(0xEE), FrameOutcome::Pending);
        assert_eq!(parser.buffered().len(), ASSEMBLY_CAPACITY);
        assert_eq!(parser.buffered()[0], 1);
        assert_eq!(parser.buffered()[ASSEMBLY_CAPACITY - 1], 0xEE);
        assert_eq!(parser.stats().overwritten, 1);
    }

    #[test]
    fn test_push_byte_keeps_newest_when_full() {
        let mut parser = FrameParser::new();
        for b in 0..(2 * ASSEMBLY_CAPACITY) as u8 {
            parser.push_byte(b);
        }
        assert_eq!(parser.buffered().len(), ASSEMBLY_CAPACITY);
        assert_eq!(parser.buffered()[0], ASSEMBLY_CAPACITY as u8);
        assert_eq!(parser.buffered()[ASSEMBLY_CAPACITY - 1], (2 * ASSEMBLY_CAPACITY - 1) as u8);
        assert_eq!(parser.stats().overwritten, ASSEMBLY_CAPACITY as u32);
    }

    #[test]
    fn test_recovers_after_overflow() {
        let mut parser = FrameParser::new();
        for _ in 0..40 {
            parser.feed(0x42);
        }
        let snapshot = Snapshot::from_bytes([9, 8, 7, 6, 5, 4, 3]);
        assert_eq!(
            feed_all(&mut parser, &snapshot.to_frame()),
            FrameOutcome::Accepted(snapshot)
        );
    }

    #[test]
    fn test_end_marker_in_payload_misframes() {
        let mut parser = FrameParser::new();
        let snapshot = Snapshot::from_bytes([0x0D, 0x0A, 0, 0, 0, 0, 0]);
        let outcome = feed_all(&mut parser, &snapshot.to_frame());
        assert_eq!(outcome, FrameOutcome::Malformed { len: 0 });
    }

    #[test]
    fn test_encode_frame() {
        let mut buf = [0u8; 16];
        let len = encode_frame(&Snapshot::NEUTRAL, &mut buf).unwrap();
        assert_eq!(len, FRAME_LEN);
        assert_eq!(
            &buf[..len],
            &[0x55, 0xAA, 0x00, 0x00, 0x0F, 128, 128, 128, 128, 0x0D, 0x0A]
        );
    }

    #[test]
    fn test_encode_frame_buffer_too_small() {
        let mut buf = [0u8; FRAME_LEN - 1];
        assert_eq!(
            encode_frame(&Snapshot::NEUTRAL, &mut buf),
            Err(EncodeError::BufferTooSmall)
        );
    }
}
