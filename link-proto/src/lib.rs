//! Wire formats for the two-board gamepad link.
//!
//! - **Types**: the 7-byte controller [`Snapshot`] with [`Buttons`] and [`DPad`]
//! - **Framing**: control-channel frames and the byte-at-a-time [`FrameParser`]
//! - **Building**: [`SnapshotBuilder`] and [`encode_frame`] for senders
//! - **Bus**: address and command constants in [`bus`]
//!
//! # Control-channel frame
//!
//! ```text
//! 55 AA <7 payload bytes> 0D 0A
//! ```
//!
//! # Example
//!
//! ```
//! use link_proto::{FrameOutcome, FrameParser};
//!
//! let mut parser = FrameParser::new();
//! let mut outcome = FrameOutcome::Pending;
//! for b in [0x55, 0xAA, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x0D, 0x0A] {
//!     outcome = parser.feed(b);
//! }
//! let FrameOutcome::Accepted(snapshot) = outcome else { panic!() };
//! assert_eq!(snapshot.buttons.raw(), 0x0201);
//! assert_eq!(snapshot.dpad, 0x03);
//! ```
//!
//! # Features
//!
//! - **`std`**: Enable standard library support (for host testing)
//! - **`defmt`**: Enable defmt formatting (for embedded logging)

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate std;

pub mod builder;
pub mod bus;
pub mod frame;
pub mod types;

pub use builder::SnapshotBuilder;
pub use bus::{BUS_FREQUENCY_HZ, BUS_TIMEOUT_MS, CMD_GET, PERIPHERAL_ADDRESS};
pub use frame::{
    encode_frame, EncodeError, FrameOutcome, FrameParser, FrameStats, ASSEMBLY_CAPACITY,
    END_MARKER, FRAME_LEN, START_MARKER,
};
pub use types::{Buttons, DPad, Snapshot, AXIS_CENTER, SNAPSHOT_LEN};
