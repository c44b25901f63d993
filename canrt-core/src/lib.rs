//! CANopen core data types
//!
//! This crate provides basic value types shared by the other canrt crates.
//! Runtime users should not depend on this crate directly. Use the `canrt::core` reexport instead.
//!
//! # References:
//!
//! * \[1\] CiA 301 CANopen application layer and communication profile v4.2.0
#![no_std]

#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InvalidValue;

/// CANopen node address [1; 7.2.2]
///
/// Zero is reserved for broadcast NMT commands, so valid node addresses are 1..=127.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NodeId(u8);

impl NodeId {
    const MIN_VALUE: u8 = 0x01;
    const MAX_VALUE: u8 = 0x7f;
    pub const MIN: NodeId = NodeId(Self::MIN_VALUE);
    pub const MAX: NodeId = NodeId(Self::MAX_VALUE);

    pub const fn new(value: u8) -> Option<Self> {
        if Self::MIN_VALUE <= value && value <= Self::MAX_VALUE {
            Some(Self(value))
        } else {
            None
        }
    }

    pub const fn into_u8(self) -> u8 {
        self.0
    }
}

impl From<NodeId> for u8 {
    fn from(value: NodeId) -> Self {
        value.into_u8()
    }
}

impl From<NodeId> for u16 {
    fn from(value: NodeId) -> Self {
        u8::from(value).into()
    }
}

impl TryFrom<u8> for NodeId {
    type Error = InvalidValue;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(InvalidValue)
    }
}

/// Function part of a pre-defined connection set identifier [1; 7.3.3]
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum FunctionCode {
    Nmt = 0x0,
    /// SYNC shares the code with EMCY; node id 0 distinguishes it
    SyncEmergency = 0x1,
    Timestamp = 0x2,
    Tpdo1 = 0x3,
    Rpdo1 = 0x4,
    Tpdo2 = 0x5,
    Rpdo2 = 0x6,
    Tpdo3 = 0x7,
    Rpdo3 = 0x8,
    Tpdo4 = 0x9,
    Rpdo4 = 0xa,
    SdoTx = 0xb,
    SdoRx = 0xc,
    Heartbeat = 0xe,
    /// Codes without a pre-defined meaning
    Other = 0xf,
}

impl FunctionCode {
    pub const fn from_u8_truncating(code: u8) -> FunctionCode {
        match code & 0xf {
            0x0 => FunctionCode::Nmt,
            0x1 => FunctionCode::SyncEmergency,
            0x2 => FunctionCode::Timestamp,
            0x3 => FunctionCode::Tpdo1,
            0x4 => FunctionCode::Rpdo1,
            0x5 => FunctionCode::Tpdo2,
            0x6 => FunctionCode::Rpdo2,
            0x7 => FunctionCode::Tpdo3,
            0x8 => FunctionCode::Rpdo3,
            0x9 => FunctionCode::Tpdo4,
            0xa => FunctionCode::Rpdo4,
            0xb => FunctionCode::SdoTx,
            0xc => FunctionCode::SdoRx,
            0xe => FunctionCode::Heartbeat,
            _ => FunctionCode::Other,
        }
    }
}

/// 11-bit communication object identifier (COB-ID)
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CobId(u16);

impl CobId {
    const MAX_VALUE: u16 = 0x7ff;
    const NODE_BITS: u16 = 7;
    pub const MAX: CobId = CobId(Self::MAX_VALUE);

    pub const fn new(value: u16) -> Option<Self> {
        if value <= Self::MAX_VALUE {
            Some(Self::from_u16_truncating(value))
        } else {
            None
        }
    }

    pub const fn from_u16_truncating(value: u16) -> Self {
        Self(value & Self::MAX_VALUE)
    }

    /// Heartbeat / NMT error control identifier of the node: `0x700 + node`
    pub const fn heartbeat(node: NodeId) -> Self {
        Self::from_parts(FunctionCode::Heartbeat, node.into_u8())
    }

    const fn from_parts(code: FunctionCode, node: u8) -> Self {
        Self::from_u16_truncating(((code as u16) << Self::NODE_BITS) | node as u16)
    }

    pub const fn function_code(self) -> FunctionCode {
        FunctionCode::from_u8_truncating((self.0 >> Self::NODE_BITS) as u8)
    }

    /// Node address encoded in the lower seven bits, if non-zero
    pub const fn node_id(self) -> Option<NodeId> {
        NodeId::new((self.0 & ((1 << Self::NODE_BITS) - 1)) as u8)
    }

    pub const fn into_u16(self) -> u16 {
        self.0
    }
}

impl From<CobId> for u16 {
    fn from(value: CobId) -> Self {
        value.into_u16()
    }
}

impl TryFrom<u16> for CobId {
    type Error = InvalidValue;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(InvalidValue)
    }
}

/// Network management state reported in heartbeats [1; 7.2.8.3.2]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum NmtState {
    BootUp = 0x00,
    Stopped = 0x04,
    Operational = 0x05,
    PreOperational = 0x7f,
}

impl NmtState {
    pub const fn try_from_u8(code: u8) -> Option<NmtState> {
        match code {
            0x00 => Some(NmtState::BootUp),
            0x04 => Some(NmtState::Stopped),
            0x05 => Some(NmtState::Operational),
            0x7f => Some(NmtState::PreOperational),
            _ => None,
        }
    }

    pub const fn into_u8(self) -> u8 {
        self as u8
    }
}

impl From<NmtState> for u8 {
    fn from(value: NmtState) -> Self {
        value.into_u8()
    }
}

impl TryFrom<u8> for NmtState {
    type Error = InvalidValue;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::try_from_u8(value).ok_or(InvalidValue)
    }
}

/// Bus bit rate from the CiA 301 bit timing table
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BaudRate {
    Kbps10,
    Kbps20,
    Kbps50,
    Kbps125,
    Kbps250,
    Kbps500,
    Kbps800,
    Mbps1,
}

impl BaudRate {
    pub const fn bits_per_second(self) -> u32 {
        match self {
            BaudRate::Kbps10 => 10_000,
            BaudRate::Kbps20 => 20_000,
            BaudRate::Kbps50 => 50_000,
            BaudRate::Kbps125 => 125_000,
            BaudRate::Kbps250 => 250_000,
            BaudRate::Kbps500 => 500_000,
            BaudRate::Kbps800 => 800_000,
            BaudRate::Mbps1 => 1_000_000,
        }
    }

    pub const fn from_bits_per_second(value: u32) -> Option<Self> {
        match value {
            10_000 => Some(BaudRate::Kbps10),
            20_000 => Some(BaudRate::Kbps20),
            50_000 => Some(BaudRate::Kbps50),
            125_000 => Some(BaudRate::Kbps125),
            250_000 => Some(BaudRate::Kbps250),
            500_000 => Some(BaudRate::Kbps500),
            800_000 => Some(BaudRate::Kbps800),
            1_000_000 => Some(BaudRate::Mbps1),
            _ => None,
        }
    }
}

impl From<BaudRate> for u32 {
    fn from(value: BaudRate) -> Self {
        value.bits_per_second()
    }
}

impl TryFrom<u32> for BaudRate {
    type Error = InvalidValue;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::from_bits_per_second(value).ok_or(InvalidValue)
    }
}
