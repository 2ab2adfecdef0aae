//! Inter-board bus constants.
//!
//! The primary unit is bus master and the secondary unit answers at a single
//! 7-bit address. One command is defined: the master writes [`CMD_GET`], then
//! reads exactly [`SNAPSHOT_LEN`](crate::SNAPSHOT_LEN) bytes.

/// 7-bit address the secondary unit answers on.
pub const PERIPHERAL_ADDRESS: u8 = 0x55;

/// Bus clock.
pub const BUS_FREQUENCY_HZ: u32 = 100_000;

/// "Send me your snapshot" command byte.
pub const CMD_GET: u8 = 0x10;

/// Upper bound for each write or read phase of a poll, in milliseconds.
pub const BUS_TIMEOUT_MS: u32 = 3;
