//! Fluent builder for snapshots and the frames that carry them.
//!
//! # Example
//!
//! ```
//! use link_proto::{Buttons, DPad, SnapshotBuilder};
//!
//! let mut buf = [0u8; 16];
//! let len = SnapshotBuilder::new()
//!     .buttons(Buttons::A | Buttons::ZR)
//!     .dpad(DPad::Left)
//!     .left_stick(255, 128)
//!     .encode(&mut buf)
//!     .unwrap();
//! assert_eq!(&buf[..2], &[0x55, 0xAA]);
//! assert_eq!(len, 11);
//! ```

use crate::frame::{encode_frame, EncodeError, FRAME_LEN};
use crate::types::{Buttons, DPad, Snapshot};

/// Builder for a [`Snapshot`], starting from [`Snapshot::NEUTRAL`].
#[derive(Debug, Clone, Copy)]
pub struct SnapshotBuilder {
    snapshot: Snapshot,
}

impl SnapshotBuilder {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            snapshot: Snapshot::NEUTRAL,
        }
    }

    /// Set the button state.
    #[must_use]
    pub fn buttons(mut self, buttons: Buttons) -> Self {
        self.snapshot.buttons = buttons;
        self
    }

    /// Press additional button(s), keeping the ones already set.
    #[must_use]
    pub fn press(mut self, buttons: Buttons) -> Self {
        self.snapshot.buttons |= buttons;
        self
    }

    /// Release button(s), keeping the others as they are.
    #[must_use]
    pub fn release(mut self, buttons: Buttons) -> Self {
        self.snapshot.buttons &= !buttons;
        self
    }

    /// Set the hat position.
    #[must_use]
    pub fn dpad(mut self, dpad: DPad) -> Self {
        self.snapshot.dpad = dpad.code();
        self
    }

    /// Set the left stick position.
    #[must_use]
    pub fn left_stick(mut self, x: u8, y: u8) -> Self {
        self.snapshot.left_x = x;
        self.snapshot.left_y = y;
        self
    }

    /// Set the right stick position.
    #[must_use]
    pub fn right_stick(mut self, x: u8, y: u8) -> Self {
        self.snapshot.right_x = x;
        self.snapshot.right_y = y;
        self
    }

    /// Get the built snapshot.
    #[must_use]
    pub fn build(self) -> Snapshot {
        self.snapshot
    }

    /// The built snapshot as a complete frame.
    #[must_use]
    pub fn frame(self) -> [u8; FRAME_LEN] {
        self.snapshot.to_frame()
    }

    /// Encode the frame into `buf`, returning the number of bytes written.
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError::BufferTooSmall`] if `buf` is shorter than a frame.
    pub fn encode(self, buf: &mut [u8]) -> Result<usize, EncodeError> {
        encode_frame(&self.snapshot, buf)
    }
}

impl Default for SnapshotBuilder {
    fn default() -> Self {
        Self::new()
    }
}
