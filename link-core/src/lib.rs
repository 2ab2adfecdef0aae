//! Platform-agnostic logic for both units of the controller link.
//!
//! Nothing here touches hardware. The firmware crates plug in an I2C master,
//! an I2C target FIFO, a USB HID endpoint and a USB serial port through the
//! traits below, so everything can be exercised on the host.
//!
//! # Overview
//!
//! Secondary unit (bus target, fed by the host):
//!
//! - [`control`]: control channel pump ([`ControlLink`], [`ControlChannel`])
//! - [`store`]: the canonical snapshot ([`SnapshotStore`])
//! - [`responder`]: interrupt-side read responder ([`BusResponder`], [`ResponderFifo`])
//! - [`diagnostics`]: periodic counters line ([`DiagnosticsReport`])
//!
//! Primary unit (bus master, USB gamepad):
//!
//! - [`poller`]: GET/read polling ([`BusPoller`], [`LinkBus`])
//! - [`publisher`]: USB report output ([`ReportPublisher`], [`ReportSink`])
//! - [`bridge`]: the cooperative loop body ([`LinkBridge`])
//!
//! Shared: [`cadence`] timers and heartbeat, [`config`] timing constants.
//!
//! # Example
//!
//! ```rust
//! use link_core::{ControlLink, SnapshotStore};
//! # use link_core::{ControlChannel, ControlError};
//! # struct Host;
//! # impl ControlChannel for Host {
//! #     async fn read(&mut self, _: &mut [u8]) -> Result<usize, ControlError> { Ok(0) }
//! # }
//! use link_proto::{Buttons, SnapshotBuilder};
//!
//! static STORE: SnapshotStore = SnapshotStore::new(link_proto::Snapshot::NEUTRAL);
//!
//! let mut link = ControlLink::new(Host, &STORE);
//! let frame = SnapshotBuilder::new().press(Buttons::A).frame();
//! assert_eq!(link.ingest(&frame), 1);
//! assert!(STORE.load().buttons.contains(Buttons::A));
//! ```
//!
//! # Features
//!
//! - **`std`**: Enable standard library support (for host testing)
//! - **`defmt`**: Enable defmt formatting (for embedded logging)

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate std;

pub mod bridge;
pub mod cadence;
pub mod config;
pub mod control;
pub mod diagnostics;
pub mod poller;
pub mod publisher;
pub mod responder;
pub mod store;

// Re-export main types at crate root
pub use bridge::{LinkBridge, StepReport};
pub use cadence::{Cadence, Heartbeat, LinkHealth};
pub use config::LinkConfig;
pub use control::{ControlChannel, ControlError, ControlLink, CONTROL_CHUNK};
pub use diagnostics::{packets, DiagnosticsReport, DIAGNOSTICS_CAPACITY, STARTUP_BANNER};
pub use poller::{health_of, BusError, BusPoller, LinkBus, PollStats, ReportState};
pub use publisher::{
    GamepadReport, OutputError, PublishOutcome, PublishStats, ReportPublisher, ReportSink,
    UsbLinkState,
};
pub use responder::{
    BusEvents, BusResponder, ResponderFifo, ResponderState, ResponderStats, TX_FIFO_DEPTH,
};
pub use store::SnapshotStore;

#[cfg(test)]
pub(crate) mod test_util {
    use core::future::Future;
    use core::pin::Pin;
    use core::task::{Context, Poll, RawWaker, RawWakerVTable, Waker};

    // Helper to run a future to completion (simple blocking executor)
    pub fn block_on<F: Future>(mut f: F) -> F::Output {
        fn noop_raw_waker() -> RawWaker {
            fn noop(_: *const ()) {}
            fn clone(_: *const ()) -> RawWaker {
                noop_raw_waker()
            }
            static VTABLE: RawWakerVTable = RawWakerVTable::new(clone, noop, noop, noop);
            RawWaker::new(core::ptr::null(), &VTABLE)
        }

        let waker = unsafe { Waker::from_raw(noop_raw_waker()) };
        let mut cx = Context::from_waker(&waker);

        // SAFETY: We don't move f after pinning
        let mut f = unsafe { Pin::new_unchecked(&mut f) };

        match f.as_mut().poll(&mut cx) {
            Poll::Ready(result) => result,
            Poll::Pending => panic!("Mock future returned Pending unexpectedly"),
        }
    }
}
