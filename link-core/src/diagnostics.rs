//! Periodic diagnostics lines written by the secondary unit.
//!
//! ```text
//! rq=<read requests> rxf=<rx-full events> stop=<stops> addr=0x55
//! sending <b0> <b1> <b2> <b3> <b4> <b5> <b6>
//! ```
//!
//! Both lines end in CRLF. The snapshot bytes are decimal. When the port
//! first opens the secondary announces itself with [`STARTUP_BANNER`].

use core::fmt;

use link_proto::{FrameStats, Snapshot};

use crate::responder::ResponderStats;

/// Upper bound on the rendered length of one report.
pub const DIAGNOSTICS_CAPACITY: usize = 128;

/// Written once when the side channel first opens.
pub const STARTUP_BANNER: &str = "SLAVE UP\r\n";

/// Split `bytes` into the packets of one bulk transfer.
///
/// A transfer that ends on a full packet (or is empty) is terminated by a
/// zero-length packet, so the last item is then `&[]`.
pub fn packets(bytes: &[u8], packet_size: usize) -> impl Iterator<Item = &[u8]> {
    let zlp = if bytes.len() % packet_size == 0 {
        Some(&[][..])
    } else {
        None
    };
    bytes.chunks(packet_size).chain(zlp)
}

/// Everything one diagnostics report shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DiagnosticsReport {
    pub responder: ResponderStats,
    pub frames: FrameStats,
    pub snapshot: Snapshot,
    pub address: u8,
}

impl fmt::Display for DiagnosticsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rq={} rxf={} stop={} addr=0x{:02X}\r\n",
            self.responder.read_requests, self.responder.rx_events, self.responder.stops, self.address
        )?;
        f.write_str("sending")?;
        for byte in self.snapshot.to_bytes() {
            write!(f, " {}", byte)?;
        }
        f.write_str("\r\n")
    }
}
