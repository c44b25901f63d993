//! Foreground diagnostic loop
//!
//! The loop polls a [`SoftTimer`]. Each time it expires, the loop masks the timer interrupts,
//! writes the TX queue, the RX queue and the transport counters to the sink, and unmasks
//! them again. The report never consumes queued messages.

use core::fmt;
use embassy_sync::blocking_mutex::raw::RawMutex;

use crate::bus::BusDriver;
use crate::config::Config;
use crate::controller::{BusController, DynamicBus};
use crate::interrupt::{InterruptControl, InterruptMutex};
use crate::time::Instant;
use crate::timer::SoftTimer;

/// Activity of a single foreground iteration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ForegroundState {
    /// The report timer has not expired
    Idle,
    /// A report was written under the interrupt mask
    Reporting,
}

/// Foreground-side handle of a [`BusController`]
pub struct Foreground<'a, I: InterruptControl, W: fmt::Write> {
    bus: &'a (dyn DynamicBus + Sync),
    mutex: &'a InterruptMutex<I>,
    timer: SoftTimer,
    out: W,
    reports: u32,
}

impl<'a, I: InterruptControl, W: fmt::Write> Foreground<'a, I, W> {
    /// Creates the loop. The first report is due one report period from now.
    pub fn new<M, D, const TX: usize, const RX: usize>(
        controller: &'a BusController<M, D, TX, RX>,
        mutex: &'a InterruptMutex<I>,
        config: &Config,
        out: W,
    ) -> Self
    where
        M: RawMutex + Sync,
        D: BusDriver + Send,
    {
        Self {
            bus: controller,
            mutex,
            timer: SoftTimer::new(config.report_period),
            out,
            reports: 0,
        }
    }

    /// Runs one loop iteration.
    ///
    /// The timer is updated on every iteration, after the report if one was due.
    pub fn poll(&mut self) -> ForegroundState {
        self.poll_at(Instant::now())
    }

    /// Runs one loop iteration at `now`.
    ///
    /// The expiry check and the timer update see the same instant, so the timer never
    /// restarts a period without reporting it.
    pub fn poll_at(&mut self, now: Instant) -> ForegroundState {
        let state = if self.timer.is_expired_at(now) {
            self.report();
            ForegroundState::Reporting
        } else {
            ForegroundState::Idle
        };
        self.timer.update_at(now);
        state
    }

    pub fn run(&mut self) -> ! {
        loop {
            self.poll();
        }
    }

    /// Number of reports written so far, wrapping
    pub fn report_count(&self) -> u32 {
        self.reports
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    pub fn output_mut(&mut self) -> &mut W {
        &mut self.out
    }

    fn report(&mut self) {
        let guard = self.mutex.lock();
        let result = self
            .bus
            .print_tx_all(&guard, &mut self.out)
            .and_then(|()| self.bus.print_rx_all(&guard, &mut self.out))
            .and_then(|()| writeln!(self.out, "{}", self.bus.statistics()));
        drop(guard);

        self.reports = self.reports.wrapping_add(1);
        if result.is_err() {
            warn!("Diagnostic sink write failed");
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;
    use super::*;
    use core::cell::Cell;
    use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
    use std::string::String;

    use crate::core::{BaudRate, NodeId};
    use crate::frame::RawFrame;

    struct NullDriver;

    impl BusDriver for NullDriver {
        type Error = ();

        fn transmit(&mut self, _frame: &RawFrame) -> Result<(), ()> {
            Ok(())
        }

        fn receive(&mut self) -> Option<RawFrame> {
            None
        }
    }

    #[derive(Default)]
    struct FlagControl {
        masked: Cell<bool>,
    }

    impl InterruptControl for FlagControl {
        fn disable(&self) {
            self.masked.set(true);
        }

        fn enable(&self) {
            self.masked.set(false);
        }
    }

    /// Sink that refuses every write
    struct BrokenSink;

    impl fmt::Write for BrokenSink {
        fn write_str(&mut self, _s: &str) -> fmt::Result {
            Err(fmt::Error)
        }
    }

    const CONFIG: Config = Config {
        // Zero period makes every poll a report
        report_period: crate::time::Duration::from_ticks(0),
        ..Config::new(NodeId::new(1).unwrap(), BaudRate::Kbps250)
    };

    #[test]
    fn test_report_contents() {
        let controller =
            BusController::<CriticalSectionRawMutex, _, 4, 4>::new(&CONFIG, NullDriver);
        let mutex = InterruptMutex::new(FlagControl::default());
        let mut foreground = Foreground::new(&controller, &mutex, &CONFIG, String::new());

        controller.queue_tx_message(controller.heartbeat_message()).unwrap();
        assert_eq!(foreground.poll(), ForegroundState::Reporting);

        let out = foreground.output();
        let mut lines = out.lines();
        assert!(lines.next().unwrap().starts_with("TX 701 [1] 05 @"));
        assert_eq!(
            lines.next(),
            Some("TX ok=0 err=0 drop=0 | RX ok=0 drop=0 bad=0")
        );
        assert_eq!(lines.next(), None);

        assert_eq!(controller.tx_len(), 1);
        assert!(!mutex.control().masked.get());
        assert_eq!(foreground.report_count(), 1);
    }

    #[test]
    fn test_sink_failure_is_not_fatal() {
        let controller =
            BusController::<CriticalSectionRawMutex, _, 4, 4>::new(&CONFIG, NullDriver);
        let mutex = InterruptMutex::new(FlagControl::default());
        let mut foreground = Foreground::new(&controller, &mutex, &CONFIG, BrokenSink);

        assert_eq!(foreground.poll(), ForegroundState::Reporting);
        assert_eq!(foreground.poll(), ForegroundState::Reporting);
        assert_eq!(foreground.report_count(), 2);
        assert!(!mutex.is_locked());
    }

    #[test]
    fn test_report_at_period_boundary() {
        let config = Config::new(NodeId::new(1).unwrap(), BaudRate::Kbps250);
        let period = config.report_period;
        let controller =
            BusController::<CriticalSectionRawMutex, _, 4, 4>::new(&config, NullDriver);
        let mutex = InterruptMutex::new(FlagControl::default());
        let start = Instant::now();
        let mut foreground = Foreground::new(&controller, &mutex, &config, String::new());
        let at = |ms: u64| start + crate::time::Duration::from_millis(ms);

        assert_eq!(foreground.poll_at(at(249)), ForegroundState::Idle);
        // The boundary instant both reports and restarts the period
        assert_eq!(foreground.poll_at(start + period), ForegroundState::Reporting);
        assert_eq!(foreground.report_count(), 1);

        assert_eq!(foreground.poll_at(at(499)), ForegroundState::Idle);
        assert_eq!(foreground.poll_at(at(500)), ForegroundState::Reporting);
        assert_eq!(foreground.report_count(), 2);

        // Every restart of the period comes with a report line
        assert_eq!(foreground.output().lines().count(), 2);
    }
}
