//! Protocol message records

use embedded_can::{Frame as _, Id, StandardId};

use crate::core::{CobId, NmtState, NodeId};
use crate::frame::{Data, RawFrame};
use crate::time::Instant;

/// Reason a received frame does not form a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecodeError {
    /// CANopen uses 11-bit identifiers only
    ExtendedId,
    RemoteFrame,
}

/// Immutable bus message
///
/// The timestamp is the creation instant for outgoing messages and the reception poll
/// instant for incoming ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Message {
    id: CobId,
    data: Data,
    timestamp: Instant,
}

impl Message {
    pub const fn new(id: CobId, data: Data, timestamp: Instant) -> Self {
        Self {
            id,
            data,
            timestamp,
        }
    }

    /// NMT error control message: a single state byte on `0x700 + node`.
    pub fn heartbeat(node: NodeId, state: NmtState, timestamp: Instant) -> Self {
        let data = unwrap!(Data::new(&[state.into_u8()]));
        Self::new(CobId::heartbeat(node), data, timestamp)
    }

    pub fn decode(frame: &RawFrame, timestamp: Instant) -> Result<Self, DecodeError> {
        let id = match frame.id() {
            Id::Standard(id) => CobId::from_u16_truncating(id.as_raw()),
            Id::Extended(_) => return Err(DecodeError::ExtendedId),
        };
        if frame.is_remote_frame() {
            return Err(DecodeError::RemoteFrame);
        }
        Ok(Self::new(id, *frame.payload(), timestamp))
    }

    pub fn to_frame(&self) -> RawFrame {
        let id = unwrap!(StandardId::new(self.id.into_u16()));
        RawFrame::new_standard(id, self.data)
    }

    pub fn id(&self) -> CobId {
        self.id
    }

    pub fn data(&self) -> &Data {
        &self.data
    }

    pub fn timestamp(&self) -> Instant {
        self.timestamp
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_can::ExtendedId;

    const NODE: NodeId = NodeId::new(1).unwrap();

    #[test]
    fn test_heartbeat() {
        let msg = Message::heartbeat(NODE, NmtState::Operational, Instant::from_millis(5));
        assert_eq!(msg.id().into_u16(), 0x701);
        assert_eq!(msg.data().as_ref(), [0x05]);
        assert_eq!(msg.timestamp(), Instant::from_millis(5));
    }

    #[test]
    fn test_frame_conversion() {
        let msg = Message::heartbeat(NODE, NmtState::PreOperational, Instant::from_millis(1));
        let frame = msg.to_frame();
        assert_eq!(frame.id(), Id::Standard(StandardId::new(0x701).unwrap()));
        assert_eq!(frame.data(), [0x7f]);

        let decoded = Message::decode(&frame, Instant::from_millis(1)).unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn test_malformed_frames() {
        let ext = RawFrame::new_extended(ExtendedId::new(0x701).unwrap(), Data::EMPTY);
        assert_eq!(
            Message::decode(&ext, Instant::from_ticks(0)),
            Err(DecodeError::ExtendedId)
        );

        let remote = RawFrame::new_remote(StandardId::new(0x701).unwrap(), 1).unwrap();
        assert_eq!(
            Message::decode(&remote, Instant::from_ticks(0)),
            Err(DecodeError::RemoteFrame)
        );
    }
}
