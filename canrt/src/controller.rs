//! Bus controller
//!
//! The controller owns the TX and RX queues and the bus driver. Interrupt handlers and the
//! foreground loop reach them only through its methods.
//!
//! Every queue or driver access runs in a dedicated short critical section of the `M` mutex,
//! so a single enqueue or dequeue is atomic whichever context calls it. Operations that walk
//! a whole queue from the foreground additionally take an [`InterruptGuard`], which keeps
//! the interrupt handlers out for the full iteration.
//!
//! The guard argument marks the call site as foreground code holding the interrupt mask. It
//! is not checked against a particular [`InterruptMutex`](crate::interrupt::InterruptMutex)
//! or its control, so the caller must pass a guard of the mutex that masks the timer
//! interrupts. Memory safety does not depend on it: every access still runs inside the
//! `M` critical section.

use core::cell::{Cell, RefCell};
use core::fmt;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::RawMutex;

use crate::bus::BusDriver;
use crate::config::Config;
use crate::core::{BaudRate, NmtState, NodeId};
use crate::interrupt::InterruptGuard;
use crate::message::Message;
use crate::queue::MessageQueue;
use crate::report::{Direction, Record};
use crate::time::Instant;

/// The message was dropped because the queue is at capacity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct QueueFull;

/// Transport counters, wrapping on overflow
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Statistics {
    /// Frames accepted by the driver
    pub tx_transmitted: u32,
    /// Frames the driver refused
    pub tx_failed: u32,
    /// Messages rejected by the full TX queue
    pub tx_overflow: u32,
    /// Messages stored in the RX queue
    pub rx_received: u32,
    /// Messages rejected by the full RX queue
    pub rx_overflow: u32,
    /// Frames that did not decode
    pub rx_malformed: u32,
}

impl Statistics {
    pub const fn new() -> Self {
        Self {
            tx_transmitted: 0,
            tx_failed: 0,
            tx_overflow: 0,
            rx_received: 0,
            rx_overflow: 0,
            rx_malformed: 0,
        }
    }
}

/// Owner of the bus queues
///
/// `TX` and `RX` are the queue capacities. Construct once, typically in a `static`
/// or a `StaticCell`, and share by reference with the [`Scheduler`](crate::scheduler::Scheduler)
/// and the [`Foreground`](crate::foreground::Foreground) loop.
pub struct BusController<M: RawMutex, D: BusDriver, const TX: usize, const RX: usize> {
    node_id: NodeId,
    baud_rate: BaudRate,
    state: Mutex<M, Cell<NmtState>>,
    tx: Mutex<M, RefCell<MessageQueue<TX>>>,
    rx: Mutex<M, RefCell<MessageQueue<RX>>>,
    driver: Mutex<M, RefCell<D>>,
    stats: Mutex<M, Cell<Statistics>>,
}

impl<M: RawMutex, D: BusDriver, const TX: usize, const RX: usize> BusController<M, D, TX, RX> {
    pub const fn new(config: &Config, driver: D) -> Self {
        Self {
            node_id: config.node_id,
            baud_rate: config.baud_rate,
            state: Mutex::new(Cell::new(config.initial_state)),
            tx: Mutex::new(RefCell::new(MessageQueue::new())),
            rx: Mutex::new(RefCell::new(MessageQueue::new())),
            driver: Mutex::new(RefCell::new(driver)),
            stats: Mutex::new(Cell::new(Statistics::new())),
        }
    }

    pub fn node_id(&self) -> NodeId {
        self.node_id
    }

    pub fn baud_rate(&self) -> BaudRate {
        self.baud_rate
    }

    pub fn nmt_state(&self) -> NmtState {
        self.state.lock(|cell| cell.get())
    }

    pub fn set_nmt_state(&self, state: NmtState) {
        let prev = self.state.lock(|cell| cell.replace(state));
        if prev != state {
            info!("NMT state {:?} -> {:?}", prev, state);
        }
    }

    /// Heartbeat carrying the current NMT state, stamped now
    pub fn heartbeat_message(&self) -> Message {
        Message::heartbeat(self.node_id, self.nmt_state(), Instant::now())
    }

    /// Appends the message to the TX queue.
    ///
    /// Callable from interrupt and foreground context alike.
    pub fn queue_tx_message(&self, message: Message) -> Result<(), QueueFull> {
        let result = self.tx.lock(|queue| queue.borrow_mut().try_push(message));
        if result.is_err() {
            self.update_stats(|stats| stats.tx_overflow = stats.tx_overflow.wrapping_add(1));
            warn!("TX queue full, dropped {:?}", message.id());
            return Err(QueueFull);
        }
        Ok(())
    }

    /// Transmits every message queued before the call, oldest first.
    ///
    /// A refused frame is counted and skipped; it is not retried. Messages queued while the
    /// flush runs wait for the next one.
    pub fn process_tx_messages(&self) {
        let pending = self.tx.lock(|queue| queue.borrow().len());
        for _ in 0..pending {
            let Some(message) = self.tx.lock(|queue| queue.borrow_mut().pop()) else {
                break;
            };
            let frame = message.to_frame();
            match self.driver.lock(|driver| driver.borrow_mut().transmit(&frame)) {
                Ok(()) => {
                    self.update_stats(|stats| {
                        stats.tx_transmitted = stats.tx_transmitted.wrapping_add(1)
                    });
                }
                Err(_) => {
                    self.update_stats(|stats| stats.tx_failed = stats.tx_failed.wrapping_add(1));
                    warn!("Transmission of {:?} failed", message.id());
                }
            }
        }
    }

    /// Moves every frame the driver has received into the RX queue.
    ///
    /// Malformed frames are discarded. When the queue is full, new messages are dropped.
    pub fn process_rx_messages(&self) {
        while let Some(frame) = self.driver.lock(|driver| driver.borrow_mut().receive()) {
            let message = match Message::decode(&frame, Instant::now()) {
                Ok(message) => message,
                Err(err) => {
                    self.update_stats(|stats| {
                        stats.rx_malformed = stats.rx_malformed.wrapping_add(1)
                    });
                    debug!("Discarded frame: {:?}", err);
                    continue;
                }
            };

            let stored = self.rx.lock(|queue| queue.borrow_mut().try_push(message));
            if stored.is_ok() {
                self.update_stats(|stats| stats.rx_received = stats.rx_received.wrapping_add(1));
            } else {
                self.update_stats(|stats| stats.rx_overflow = stats.rx_overflow.wrapping_add(1));
                warn!("RX queue full, dropped {:?}", message.id());
            }
        }
    }

    /// Removes the oldest received message.
    pub fn pop_rx_message(&self, _guard: &InterruptGuard<'_>) -> Option<Message> {
        self.rx.lock(|queue| queue.borrow_mut().pop())
    }

    /// Visits queued TX messages in order without removing them.
    pub fn for_each_tx(&self, _guard: &InterruptGuard<'_>, f: impl FnMut(&Message)) {
        self.tx.lock(|queue| queue.borrow().iter().for_each(f));
    }

    /// Visits queued RX messages in order without removing them.
    pub fn for_each_rx(&self, _guard: &InterruptGuard<'_>, f: impl FnMut(&Message)) {
        self.rx.lock(|queue| queue.borrow().iter().for_each(f));
    }

    /// Writes one line per queued TX message.
    pub fn print_tx_all(
        &self,
        _guard: &InterruptGuard<'_>,
        out: &mut dyn fmt::Write,
    ) -> fmt::Result {
        self.tx.lock(|queue| print_all(&queue.borrow(), Direction::Tx, out))
    }

    /// Writes one line per queued RX message.
    pub fn print_rx_all(
        &self,
        _guard: &InterruptGuard<'_>,
        out: &mut dyn fmt::Write,
    ) -> fmt::Result {
        self.rx.lock(|queue| print_all(&queue.borrow(), Direction::Rx, out))
    }

    pub fn tx_len(&self) -> usize {
        self.tx.lock(|queue| queue.borrow().len())
    }

    pub fn rx_len(&self) -> usize {
        self.rx.lock(|queue| queue.borrow().len())
    }

    pub fn statistics(&self) -> Statistics {
        self.stats.lock(|cell| cell.get())
    }

    /// Gives foreground code access to the driver, e.g., for error counters.
    pub fn with_driver<R>(&self, _guard: &InterruptGuard<'_>, f: impl FnOnce(&mut D) -> R) -> R {
        self.driver.lock(|driver| f(&mut driver.borrow_mut()))
    }

    fn update_stats(&self, f: impl FnOnce(&mut Statistics)) {
        self.stats.lock(|cell| {
            let mut stats = cell.get();
            f(&mut stats);
            cell.set(stats);
        });
    }
}

fn print_all<const N: usize>(
    queue: &MessageQueue<N>,
    direction: Direction,
    out: &mut dyn fmt::Write,
) -> fmt::Result {
    queue
        .iter()
        .try_for_each(|message| writeln!(out, "{}", Record { direction, message }))
}

/// Type-erased controller access for the scheduler and the foreground loop
pub(crate) trait DynamicBus {
    fn queue_tx_message(&self, message: Message) -> Result<(), QueueFull>;
    fn process_tx_messages(&self);
    fn process_rx_messages(&self);
    fn heartbeat_message(&self) -> Message;
    fn print_tx_all(&self, guard: &InterruptGuard<'_>, out: &mut dyn fmt::Write) -> fmt::Result;
    fn print_rx_all(&self, guard: &InterruptGuard<'_>, out: &mut dyn fmt::Write) -> fmt::Result;
    fn statistics(&self) -> Statistics;
}

impl<M: RawMutex, D: BusDriver, const TX: usize, const RX: usize> DynamicBus
    for BusController<M, D, TX, RX>
{
    fn queue_tx_message(&self, message: Message) -> Result<(), QueueFull> {
        Self::queue_tx_message(self, message)
    }

    fn process_tx_messages(&self) {
        Self::process_tx_messages(self)
    }

    fn process_rx_messages(&self) {
        Self::process_rx_messages(self)
    }

    fn heartbeat_message(&self) -> Message {
        Self::heartbeat_message(self)
    }

    fn print_tx_all(&self, guard: &InterruptGuard<'_>, out: &mut dyn fmt::Write) -> fmt::Result {
        Self::print_tx_all(self, guard, out)
    }

    fn print_rx_all(&self, guard: &InterruptGuard<'_>, out: &mut dyn fmt::Write) -> fmt::Result {
        Self::print_rx_all(self, guard, out)
    }

    fn statistics(&self) -> Statistics {
        Self::statistics(self)
    }
}
