//! Per-task cadences driven by an explicit millisecond clock.
//!
//! Nothing here reads a clock. Callers pass `now_ms` (for example
//! `Instant::now().as_millis() as u32` on target, or a plain counter in
//! tests). Arithmetic wraps, so a `u32` millisecond counter rolling over
//! after ~49 days is harmless.

/// Fires at most once per period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Cadence {
    period_ms: u32,
    last_ms: u32,
}

impl Cadence {
    /// Create a cadence whose first tick is due at `period_ms`.
    #[must_use]
    pub const fn new(period_ms: u32) -> Self {
        Self {
            period_ms,
            last_ms: 0,
        }
    }

    /// Returns `true` and rearms if at least one period passed since the last tick.
    pub fn due(&mut self, now_ms: u32) -> bool {
        if now_ms.wrapping_sub(self.last_ms) >= self.period_ms {
            self.last_ms = now_ms;
            true
        } else {
            false
        }
    }

    /// Change the period without moving the last tick.
    pub fn set_period(&mut self, period_ms: u32) {
        self.period_ms = period_ms;
    }

    #[inline]
    #[must_use]
    pub const fn period_ms(&self) -> u32 {
        self.period_ms
    }
}

/// Coarse link health, shown through the heartbeat cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkHealth {
    /// Last poll succeeded.
    Healthy,
    /// Last poll failed; report data is stale.
    Degraded,
}

/// Blinking indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Heartbeat {
    cadence: Cadence,
    level: bool,
    healthy_ms: u32,
    degraded_ms: u32,
}

impl Heartbeat {
    /// Heartbeat whose period follows [`LinkHealth`]. Starts degraded.
    #[must_use]
    pub const fn new(healthy_ms: u32, degraded_ms: u32) -> Self {
        Self {
            cadence: Cadence::new(degraded_ms),
            level: false,
            healthy_ms,
            degraded_ms,
        }
    }

    /// Heartbeat with one period regardless of health.
    #[must_use]
    pub const fn fixed(period_ms: u32) -> Self {
        Self::new(period_ms, period_ms)
    }

    /// Select the period for `health`.
    pub fn set_health(&mut self, health: LinkHealth) {
        self.cadence.set_period(match health {
            LinkHealth::Healthy => self.healthy_ms,
            LinkHealth::Degraded => self.degraded_ms,
        });
    }

    /// Returns the new indicator level when it is time to toggle.
    pub fn tick(&mut self, now_ms: u32) -> Option<bool> {
        if self.cadence.due(now_ms) {
            self.level = !self.level;
            Some(self.level)
        } else {
            None
        }
    }

    #[inline]
    #[must_use]
    pub const fn period_ms(&self) -> u32 {
        self.cadence.period_ms()
    }
}
