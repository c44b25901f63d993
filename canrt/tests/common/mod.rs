#![allow(dead_code)]

use canrt::bus::BusDriver;
use canrt::frame::{Data, RawFrame};
use embedded_can::{Frame as _, Id, StandardId};
use std::collections::VecDeque;
use std::vec::Vec;

/// Scripted bus: records transmissions, refuses selected attempts, serves an inbox
#[derive(Default)]
pub struct ScriptedBus {
    pub transmitted: Vec<RawFrame>,
    pub attempts: Vec<u16>,
    /// Zero-based transmit attempt numbers to refuse
    pub fail_attempts: Vec<usize>,
    pub inbox: VecDeque<RawFrame>,
}

#[derive(Debug, PartialEq, Eq)]
pub struct Refused;

impl BusDriver for ScriptedBus {
    type Error = Refused;

    fn transmit(&mut self, frame: &RawFrame) -> Result<(), Refused> {
        let attempt = self.attempts.len();
        self.attempts.push(raw_id(frame));
        if self.fail_attempts.contains(&attempt) {
            return Err(Refused);
        }
        self.transmitted.push(*frame);
        Ok(())
    }

    fn receive(&mut self) -> Option<RawFrame> {
        self.inbox.pop_front()
    }
}

pub fn raw_id(frame: &RawFrame) -> u16 {
    match frame.id() {
        Id::Standard(id) => id.as_raw(),
        Id::Extended(_) => panic!("extended id on a CANopen bus"),
    }
}

pub fn frame(id: u16, payload: &[u8]) -> RawFrame {
    RawFrame::new_standard(StandardId::new(id).unwrap(), Data::new(payload).unwrap())
}
