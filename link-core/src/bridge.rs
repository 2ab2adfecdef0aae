//! LinkBridge: the primary unit's cooperative loop body.
//!
//! Each call to [`LinkBridge::step`] runs whichever of the three periodic
//! tasks are due, in a fixed order: poll the secondary, publish the USB
//! report, toggle the heartbeat. No task blocks the others for longer than
//! its own bound.

use link_proto::Snapshot;

use crate::cadence::{Cadence, Heartbeat};
use crate::config::LinkConfig;
use crate::poller::{health_of, BusError, BusPoller, LinkBus, PollStats, ReportState};
use crate::publisher::{PublishOutcome, PublishStats, ReportPublisher, ReportSink};

/// What one [`LinkBridge::step`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StepReport {
    /// Poll result, if a poll was due.
    pub poll: Option<Result<Snapshot, BusError>>,
    pub publish: PublishOutcome,
    /// New heartbeat level, if it toggled.
    pub led: Option<bool>,
}

/// Bus poller, report publisher and heartbeat driven from one loop.
///
/// # Error Handling
///
/// A failed poll keeps the previous report state (the host keeps receiving
/// the last good snapshot) and slows the heartbeat to the degraded period.
/// The next successful poll restores the healthy period.
pub struct LinkBridge<B, S> {
    poller: BusPoller<B>,
    sink: S,
    poll_cadence: Cadence,
    publisher: ReportPublisher,
    heartbeat: Heartbeat,
}

impl<B: LinkBus, S: ReportSink> LinkBridge<B, S> {
    /// Create a new bridge from a bus, a report sink and the link timing.
    pub fn new(bus: B, sink: S, config: &LinkConfig) -> Self {
        Self {
            poller: BusPoller::new(bus),
            sink,
            poll_cadence: Cadence::new(config.poll_period_ms),
            publisher: ReportPublisher::new(config.publish_period_ms),
            heartbeat: Heartbeat::new(config.healthy_blink_ms, config.degraded_blink_ms),
        }
    }

    /// Run every task that is due at `now_ms`.
    pub async fn step(&mut self, now_ms: u32) -> StepReport {
        let poll = if self.poll_cadence.due(now_ms) {
            let result = self.poller.poll().await;
            self.heartbeat.set_health(health_of(&result));
            Some(result)
        } else {
            None
        };

        let publish = self
            .publisher
            .tick(now_ms, self.poller.report(), &mut self.sink)
            .await;

        let led = self.heartbeat.tick(now_ms);

        StepReport { poll, publish, led }
    }

    #[inline]
    #[must_use]
    pub fn report(&self) -> &ReportState {
        self.poller.report()
    }

    #[inline]
    #[must_use]
    pub fn poll_stats(&self) -> PollStats {
        self.poller.stats()
    }

    #[inline]
    #[must_use]
    pub fn publish_stats(&self) -> PublishStats {
        self.publisher.stats()
    }

    #[inline]
    #[must_use]
    pub fn heartbeat_period_ms(&self) -> u32 {
        self.heartbeat.period_ms()
    }

    /// Get a mutable reference to the bus.
    pub fn bus_mut(&mut self) -> &mut B {
        self.poller.bus_mut()
    }

    /// Get a reference to the report sink.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Get a mutable reference to the report sink.
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Decompose the bridge into its bus and sink.
    pub fn into_parts(self) -> (B, S) {
        (self.poller.into_bus(), self.sink)
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::poller::tests::MockBus;
    use crate::publisher::tests::MockSink;
    use crate::test_util::block_on;

    const REPLY: [u8; 7] = [0x04, 0x00, 0x0F, 0x80, 0x80, 0x80, 0x80];

    #[test]
    fn test_successful_polls_forward_snapshot() {
        let config = LinkConfig::default();
        let mut bridge = LinkBridge::new(MockBus::answering(REPLY), MockSink::ready(), &config);

        let step = block_on(bridge.step(10));
        assert_eq!(step.poll, Some(Ok(Snapshot::from_bytes(REPLY))));
        assert_eq!(step.publish, PublishOutcome::Sent);
        assert_eq!(bridge.heartbeat_period_ms(), config.healthy_blink_ms);

        let (_, sink) = bridge.into_parts();
        assert_eq!(sink.sent[0][..7], REPLY);
    }

    #[test]
    fn test_failed_polls_keep_stale_state_and_slow_heartbeat() {
        let config = LinkConfig::default();
        let mut bridge = LinkBridge::new(MockBus::answering(REPLY), MockSink::ready(), &config);
        block_on(bridge.step(10));

        bridge.bus_mut().writes = std::vec![Err(BusError::Nack); 64];
        for now in 11..=200 {
            let _ = block_on(bridge.step(now));
        }

        assert_eq!(bridge.report().snapshot(), Snapshot::from_bytes(REPLY));
        assert_eq!(bridge.heartbeat_period_ms(), config.degraded_blink_ms);
        assert_eq!(bridge.poll_stats().nacks, 19);
        assert!(bridge.sink().sent.iter().all(|r| r[..7] == REPLY));
    }

    #[test]
    fn test_never_acknowledged_sends_neutral() {
        let config = LinkConfig::default();
        let mut bridge = LinkBridge::new(
            MockBus::failing(BusError::Nack),
            MockSink::ready(),
            &config,
        );

        let step = block_on(bridge.step(10));
        assert_eq!(step.poll, Some(Err(BusError::Nack)));
        assert_eq!(bridge.heartbeat_period_ms(), config.degraded_blink_ms);
        assert_eq!(bridge.sink().sent[0][..7], Snapshot::NEUTRAL.to_bytes());
    }

    #[test]
    fn test_not_ready_sink_skips_but_polling_continues() {
        let config = LinkConfig::default();
        let mut sink = MockSink::ready();
        sink.ready = false;
        let mut bridge = LinkBridge::new(MockBus::answering(REPLY), sink, &config);

        let step = block_on(bridge.step(10));
        assert!(matches!(step.poll, Some(Ok(_))));
        assert_eq!(step.publish, PublishOutcome::Skipped);
        assert!(bridge.sink().sent.is_empty());

        bridge.sink_mut().ready = true;
        let step = block_on(bridge.step(20));
        assert_eq!(step.publish, PublishOutcome::Sent);
        assert_eq!(bridge.publish_stats().skipped, 1);
    }

    #[test]
    fn test_heartbeat_toggles_at_healthy_rate() {
        let config = LinkConfig::default();
        let mut bridge = LinkBridge::new(MockBus::answering(REPLY), MockSink::ready(), &config);

        let toggles = (1..=1000)
            .filter_map(|now| block_on(bridge.step(now)).led)
            .count();
        assert_eq!(toggles, 10);
    }
}
