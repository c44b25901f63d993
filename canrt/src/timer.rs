//! Polled software timer
//!
//! The timer needs no interrupt: the owner polls it. Checking eligibility and committing to
//! a new period are separate steps, so the caller can run its gated work in between.

use crate::time::{Duration, Instant};

/// Periodic elapsed-time check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SoftTimer {
    period: Duration,
    reference: Instant,
}

impl SoftTimer {
    /// Creates a timer whose first period starts now.
    pub fn new(period: Duration) -> Self {
        Self::new_at(period, Instant::now())
    }

    pub fn from_millis(period_ms: u64) -> Self {
        Self::new(Duration::from_millis(period_ms))
    }

    pub const fn new_at(period: Duration, now: Instant) -> Self {
        Self {
            period,
            reference: now,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Returns true once a full period has elapsed since the last reset.
    ///
    /// The query does not change the timer.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    pub fn is_expired_at(&self, now: Instant) -> bool {
        self.elapsed_at(now) >= self.period
    }

    /// Restarts the period if it has elapsed. Returns true on restart.
    pub fn update(&mut self) -> bool {
        self.update_at(Instant::now())
    }

    pub fn update_at(&mut self, now: Instant) -> bool {
        if self.is_expired_at(now) {
            self.reference = now;
            true
        } else {
            false
        }
    }

    /// Time since the last reset, tolerant to tick counter overflow
    pub fn elapsed_at(&self, now: Instant) -> Duration {
        Duration::from_ticks(now.as_ticks().wrapping_sub(self.reference.as_ticks()))
    }
}
