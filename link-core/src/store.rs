//! The secondary unit's canonical snapshot.
//!
//! # Access rules
//!
//! - Written only from the cooperative main loop, by the control-channel pump.
//! - Read from the bus interrupt, once per read transaction.
//!
//! The 7 snapshot bytes are packed into one 64-bit atomic, so a reader always
//! sees either the old or the new snapshot in full. On Cortex-M0 the atomic is
//! emulated with a critical section by `portable-atomic`.

use link_proto::{Snapshot, SNAPSHOT_LEN};
use portable_atomic::{AtomicU64, Ordering};

/// Shared, fixed-size snapshot cell. Place it in a `static`.
pub struct SnapshotStore {
    packed: AtomicU64,
}

impl SnapshotStore {
    /// Create a store holding `initial`.
    #[must_use]
    pub const fn new(initial: Snapshot) -> Self {
        Self {
            packed: AtomicU64::new(pack(initial)),
        }
    }

    /// Replace the snapshot in one step.
    #[inline]
    pub fn store(&self, snapshot: Snapshot) {
        self.packed.store(pack(snapshot), Ordering::Release);
    }

    /// Copy the current snapshot out.
    #[inline]
    #[must_use]
    pub fn load(&self) -> Snapshot {
        unpack(self.packed.load(Ordering::Acquire))
    }
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new(Snapshot::NEUTRAL)
    }
}

const fn pack(snapshot: Snapshot) -> u64 {
    let bytes = snapshot.to_bytes();
    let mut wide = [0u8; 8];
    let mut i = 0;
    while i < SNAPSHOT_LEN {
        wide[i] = bytes[i];
        i += 1;
    }
    u64::from_le_bytes(wide)
}

const fn unpack(packed: u64) -> Snapshot {
    let wide = packed.to_le_bytes();
    Snapshot::from_bytes([
        wide[0], wide[1], wide[2], wide[3], wide[4], wide[5], wide[6],
    ])
}
