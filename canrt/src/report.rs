//! Human-readable diagnostic lines
//!
//! Format of a message record: `TX 701 [1] 05 @1000ms`, i.e., direction, COB-ID in hex,
//! data length, payload bytes and timestamp.

use core::fmt;

use crate::controller::Statistics;
use crate::message::Message;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    Tx,
    Rx,
}

impl Direction {
    pub fn tag(self) -> &'static str {
        match self {
            Direction::Tx => "TX",
            Direction::Rx => "RX",
        }
    }
}

/// A queued message as printed by the diagnostic report
pub struct Record<'a> {
    pub direction: Direction,
    pub message: &'a Message,
}

impl fmt::Display for Record<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.message.data();
        write!(
            f,
            "{} {:03X} [{}]",
            self.direction.tag(),
            self.message.id().into_u16(),
            data.len()
        )?;
        for byte in data.iter() {
            write!(f, " {:02X}", byte)?;
        }
        write!(f, " @{}ms", self.message.timestamp().as_millis())
    }
}

impl fmt::Display for Statistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TX ok={} err={} drop={} | RX ok={} drop={} bad={}",
            self.tx_transmitted,
            self.tx_failed,
            self.tx_overflow,
            self.rx_received,
            self.rx_overflow,
            self.rx_malformed
        )
    }
}
