//! canrt driver interface
//!
//! The crate provides an interface between a CAN device driver and the canrt runtime.
//! Limited scope facilitates compatibility across versions.
//! Driver crates should depend on this crate. Runtime users should depend on
//! the `canrt` crate instead.
//!
//! A driver implements [`bus::BusDriver`]: a polled, non-blocking pair of operations to hand
//! a frame to the peripheral and to fetch received frames. The runtime calls them from timer
//! interrupt handlers, so a driver may not block and may not allocate.
//!
//! Frames cross the boundary as [`frame::RawFrame`], which implements [`embedded_can::Frame`].
//! HAL frames convert with [`frame::RawFrame::from_frame`].

#![no_std]

// This mod MUST go first, so that the others see its macros.
pub(crate) mod fmt;

pub mod bus;
pub mod frame;

pub mod time {
    pub use embassy_time::{Duration, Instant};
}
