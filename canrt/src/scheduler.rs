//! Periodic interrupt-context activities
//!
//! Three hardware timers drive the bus: the heartbeat producer, the transmit flush and the
//! receive poll. The platform owns the timers and calls [`Scheduler::on_interrupt`] from each
//! timer's handler. Handlers may preempt the foreground loop at any point, but never each
//! other's critical sections.

use embassy_sync::blocking_mutex::raw::RawMutex;

use crate::bus::BusDriver;
use crate::config::Config;
use crate::controller::{BusController, DynamicBus};
use crate::time::Duration;

/// Periodic activity of the runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Trigger {
    /// Queue a heartbeat for transmission
    Heartbeat,
    /// Hand queued messages to the driver
    TxFlush,
    /// Collect received frames from the driver
    RxPoll,
}

impl Trigger {
    pub const ALL: [Trigger; 3] = [Trigger::Heartbeat, Trigger::TxFlush, Trigger::RxPoll];
}

/// Platform interval timers
///
/// Once started, the timer for `trigger` must call [`Scheduler::on_interrupt`] every `period`.
pub trait TimerFacility {
    fn start_periodic(&mut self, trigger: Trigger, period: Duration);
}

/// Interrupt-side handle of a [`BusController`]
#[derive(Clone, Copy)]
pub struct Scheduler<'a> {
    bus: &'a (dyn DynamicBus + Sync),
    heartbeat_period: Duration,
    tx_flush_period: Duration,
    rx_poll_period: Duration,
}

impl<'a> Scheduler<'a> {
    pub fn new<M, D, const TX: usize, const RX: usize>(
        controller: &'a BusController<M, D, TX, RX>,
        config: &Config,
    ) -> Self
    where
        M: RawMutex + Sync,
        D: BusDriver + Send,
    {
        Self {
            bus: controller,
            heartbeat_period: config.heartbeat_period,
            tx_flush_period: config.tx_flush_period,
            rx_poll_period: config.rx_poll_period,
        }
    }

    pub fn period(&self, trigger: Trigger) -> Duration {
        match trigger {
            Trigger::Heartbeat => self.heartbeat_period,
            Trigger::TxFlush => self.tx_flush_period,
            Trigger::RxPoll => self.rx_poll_period,
        }
    }

    /// Arms every periodic trigger.
    pub fn start(&self, timers: &mut impl TimerFacility) {
        for trigger in Trigger::ALL {
            timers.start_periodic(trigger, self.period(trigger));
        }
        info!(
            "Scheduler started: heartbeat {} ms, TX flush {} ms, RX poll {} ms",
            self.heartbeat_period.as_millis(),
            self.tx_flush_period.as_millis(),
            self.rx_poll_period.as_millis()
        );
    }

    /// Timer interrupt entry point
    pub fn on_interrupt(&self, trigger: Trigger) {
        match trigger {
            Trigger::Heartbeat => self.on_heartbeat(),
            Trigger::TxFlush => self.on_tx_flush(),
            Trigger::RxPoll => self.on_rx_poll(),
        }
    }

    pub fn on_heartbeat(&self) {
        trace!("Heartbeat");
        // A full queue is counted and reported by the controller
        let _ = self.bus.queue_tx_message(self.bus.heartbeat_message());
    }

    pub fn on_tx_flush(&self) {
        self.bus.process_tx_messages();
    }

    pub fn on_rx_poll(&self) {
        self.bus.process_rx_messages();
    }
}

#[cfg(test)]
mod tests {
    extern crate std;
    use super::*;
    use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
    use std::vec::Vec;

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
    struct RecordingTimers(Vec<(Trigger, Duration)>);

    impl TimerFacility for RecordingTimers {
        fn start_periodic(&mut self, trigger: Trigger, period: Duration) {
            self.0.push((trigger, period));
        }
    }

    const CONFIG: Config = Config::new(NodeId::new(3).unwrap(), BaudRate::Kbps250);

    #[test]
    fn test_start_arms_all_triggers() {
        let controller =
            BusController::<CriticalSectionRawMutex, _, 4, 4>::new(&CONFIG, NullDriver);
        let scheduler = Scheduler::new(&controller, &CONFIG);
        let mut timers = RecordingTimers::default();

        scheduler.start(&mut timers);

        assert_eq!(
            timers.0,
            [
                (Trigger::Heartbeat, Duration::from_secs(1)),
                (Trigger::TxFlush, Duration::from_millis(20)),
                (Trigger::RxPoll, Duration::from_millis(3)),
            ]
        );
    }

    #[test]
    fn test_dispatch() {
        let controller =
            BusController::<CriticalSectionRawMutex, _, 4, 4>::new(&CONFIG, NullDriver);
        let scheduler = Scheduler::new(&controller, &CONFIG);

        scheduler.on_interrupt(Trigger::Heartbeat);
        scheduler.on_interrupt(Trigger::Heartbeat);
        assert_eq!(controller.tx_len(), 2);

        scheduler.on_interrupt(Trigger::RxPoll);
        assert_eq!(controller.tx_len(), 2);

        scheduler.on_interrupt(Trigger::TxFlush);
        assert_eq!(controller.tx_len(), 0);
        assert_eq!(controller.statistics().tx_transmitted, 2);
    }
}
