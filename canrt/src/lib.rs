//! # canrt
//!
//! This library provides the transport runtime of an interrupt-driven CAN node in no_std
//! environments. It keeps outgoing and incoming messages in fixed-capacity queues, drives the
//! bus from periodic timer interrupts, and lets a foreground loop inspect the queues without
//! racing the interrupt handlers. It requires no dynamic memory allocation.
//!
//! Message identifiers follow the CANopen \[1\] COB-ID layout. The node publishes a
//! heartbeat carrying its NMT state on `0x700 + node_id`.
//!
//! ## Architecture
//!
//! ```text
//!  timer interrupts                         foreground
//! ┌─────────────────┐                   ┌────────────────┐
//! │    Scheduler    │                   │   Foreground   │
//! │ heartbeat 1 s   │                   │ SoftTimer 250ms│
//! │ TX flush  20 ms │                   └───────┬────────┘
//! │ RX poll    3 ms │                           │ InterruptGuard
//! └────────┬────────┘                           ▼
//!          │           ┌───────────────────────────────┐
//!          └──────────►│         BusController         │
//!                      │ ┌──────────┐   ┌──────────┐   │
//!                      │ │ TX queue │   │ RX queue │   │
//!                      │ └────┬─────┘   └────▲─────┘   │
//!                      └──────┼──────────────┼─────────┘
//!                             ▼              │
//!                      ┌─────────────────────┴─┐
//!                      │       BusDriver       │
//!                      └───────────────────────┘
//! ```
//! Components:
//! * _BusController_ owns the queues, the driver and the node state (NodeId, NMT state,
//!   transport counters).
//! * _Scheduler_ is the interrupt-side handle. The platform arms one periodic timer per
//!   [`scheduler::Trigger`] and calls the scheduler from each handler: the heartbeat trigger
//!   queues a heartbeat, the TX flush trigger hands queued messages to the driver, the RX poll
//!   trigger moves received frames into the RX queue.
//! * _Foreground_ is the main-loop handle. It prints both queues and the counters to a text
//!   sink whenever its software timer expires.
//! * _BusDriver_ is the device driver interface, see the `canrt-driver` crate.
//!
//! ## Concurrency model
//!
//! There are two kinds of synchronization:
//! * Each queue, driver or state access runs in a dedicated critical section of the
//!   controller's raw mutex. With _CriticalSectionRawMutex_ a single enqueue or dequeue is
//!   atomic with respect to every interrupt handler. Critical sections are O(1) except the
//!   driver calls, whose duration the driver bounds.
//! * Foreground operations that walk or drain a queue take an [`interrupt::InterruptGuard`]
//!   from an [`interrupt::InterruptMutex`]. The guard masks the timer interrupts for the whole
//!   walk and unmasks them on every exit path.
//!
//! Queues reject new messages when full. A rejected message is counted and logged.
//!
//! ## Example
//!
//! ```
//! use canrt::bus::BusDriver;
//! use canrt::config::Config;
//! use canrt::controller::BusController;
//! use canrt::core::{BaudRate, NodeId};
//! use canrt::foreground::Foreground;
//! use canrt::frame::RawFrame;
//! use canrt::interrupt::{CriticalSectionControl, InterruptMutex};
//! use canrt::scheduler::{Scheduler, Trigger};
//! use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
//! use static_cell::StaticCell;
//!
//! struct Can;
//!
//! impl BusDriver for Can {
//!     type Error = ();
//!
//!     fn transmit(&mut self, _frame: &RawFrame) -> Result<(), ()> {
//!         Ok(())
//!     }
//!
//!     fn receive(&mut self) -> Option<RawFrame> {
//!         None
//!     }
//! }
//!
//! type Controller = BusController<CriticalSectionRawMutex, Can, 16, 16>;
//!
//! const CONFIG: Config = Config::new(NodeId::new(3).unwrap(), BaudRate::Kbps250);
//! static CONTROLLER: StaticCell<Controller> = StaticCell::new();
//!
//! let controller: &'static Controller = CONTROLLER.init(Controller::new(&CONFIG, Can));
//!
//! // Shared with the timer interrupt handlers
//! let scheduler = Scheduler::new(controller, &CONFIG);
//! scheduler.on_interrupt(Trigger::Heartbeat);
//! scheduler.on_interrupt(Trigger::TxFlush);
//! assert_eq!(controller.statistics().tx_transmitted, 1);
//!
//! let mutex = InterruptMutex::new(CriticalSectionControl::new());
//! let mut foreground = Foreground::new(controller, &mutex, &CONFIG, String::new());
//! foreground.poll();
//! ```
//!
//! ## Limitations
//!
//! * Only 11-bit identifiers are supported. Extended and remote frames are discarded.
//! * Failed transmissions are not retried.
//! * The no_std target supports single-CPU systems only (embassy_sync limitation).
//!
//! # References:
//!
//! * \[1\] CiA 301, CANopen application layer and communication profile
#![no_std]

pub use canrt_core as core;
pub use canrt_driver::{bus, frame, time};

// This mod MUST go first, so that the others see its macros.
pub(crate) mod fmt;

pub mod config;
pub mod controller;
pub mod foreground;
pub mod interrupt;
pub mod message;
pub mod queue;
pub mod report;
pub mod scheduler;
pub mod timer;
