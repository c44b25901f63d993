mod common;

use canrt::config::Config;
use canrt::controller::BusController;
use canrt::core::{BaudRate, NodeId};
use canrt::interrupt::{InterruptControl, InterruptMutex};
use canrt::scheduler::{Scheduler, Trigger};
use common::{ScriptedBus, frame};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use std::cell::{Cell, RefCell};
use std::vec::Vec;

const CONFIG: Config = Config::new(NodeId::new(5).unwrap(), BaudRate::Kbps125);

/// Interrupt controller model: requests raised while masked stay pending until unmasked
#[derive(Default)]
struct PendingControl {
    masked: Cell<bool>,
    pending: RefCell<Vec<Trigger>>,
    delivered: RefCell<Vec<Trigger>>,
}

impl PendingControl {
    fn raise(&self, trigger: Trigger) {
        if self.masked.get() {
            self.pending.borrow_mut().push(trigger);
        } else {
            self.delivered.borrow_mut().push(trigger);
        }
    }
}

impl InterruptControl for PendingControl {
    fn disable(&self) {
        self.masked.set(true);
    }

    fn enable(&self) {
        self.masked.set(false);
        let pending = std::mem::take(&mut *self.pending.borrow_mut());
        self.delivered.borrow_mut().extend(pending);
    }
}

#[test]
fn test_interrupts_wait_for_guard() {
    let mut bus = ScriptedBus::default();
    bus.inbox.push_back(frame(0x185, &[1]));
    let controller = BusController::<CriticalSectionRawMutex, _, 4, 4>::new(&CONFIG, bus);
    let scheduler = Scheduler::new(&controller, &CONFIG);
    let mutex = InterruptMutex::new(PendingControl::default());

    let deliver = || {
        let triggers = std::mem::take(&mut *mutex.control().delivered.borrow_mut());
        for trigger in triggers {
            scheduler.on_interrupt(trigger);
        }
    };

    let popped = {
        let guard = mutex.lock();
        // The poll timer fires while the foreground walks the queue
        mutex.control().raise(Trigger::RxPoll);
        deliver();
        assert_eq!(controller.rx_len(), 0);
        controller.pop_rx_message(&guard)
    };
    assert_eq!(popped, None);

    // Unmasking delivers the pending request
    deliver();
    assert_eq!(controller.rx_len(), 1);

    let popped = mutex.with(|guard| controller.pop_rx_message(guard));
    assert_eq!(popped.map(|m| m.id().into_u16()), Some(0x185));
}

#[test]
fn test_push_pop_serializations() {
    // Either the push precedes the pop or the other way round; nothing else is observable
    let run = |push_first: bool| {
        let mut bus = ScriptedBus::default();
        bus.inbox.push_back(frame(0x185, &[1]));
        let controller = BusController::<CriticalSectionRawMutex, _, 4, 4>::new(&CONFIG, bus);
        let scheduler = Scheduler::new(&controller, &CONFIG);
        let mutex = InterruptMutex::new(PendingControl::default());

        if push_first {
            scheduler.on_interrupt(Trigger::RxPoll);
        }
        let popped = mutex.with(|guard| controller.pop_rx_message(guard));
        if !push_first {
            scheduler.on_interrupt(Trigger::RxPoll);
        }
        (popped.map(|m| m.id().into_u16()), controller.rx_len())
    };

    assert_eq!(run(true), (Some(0x185), 0));
    assert_eq!(run(false), (None, 1));
}
