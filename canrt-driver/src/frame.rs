//! Bus frame object

use embedded_can::{ExtendedId, Id, StandardId};

/// Classic CAN data field capacity
pub const MAX_DATA_LENGTH: usize = 8;

#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InvalidLength;

/// Classic CAN data vector
///
/// Storage is fixed at eight bytes; the length selects the visible prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Data {
    length: u8,
    bytes: [u8; MAX_DATA_LENGTH],
}

impl Data {
    pub const EMPTY: Data = Data {
        length: 0,
        bytes: [0; MAX_DATA_LENGTH],
    };

    /// Creates a new vector from a slice of compatible length.
    pub fn new(data: &[u8]) -> Result<Self, InvalidLength> {
        if data.len() > MAX_DATA_LENGTH {
            return Err(InvalidLength);
        }
        let mut bytes = [0; MAX_DATA_LENGTH];
        bytes[..data.len()].copy_from_slice(data);

        Ok(Self {
            length: data.len() as u8,
            bytes,
        })
    }

    pub fn new_zeros(length: usize) -> Result<Self, InvalidLength> {
        if length > MAX_DATA_LENGTH {
            return Err(InvalidLength);
        }
        Ok(Self {
            length: length as u8,
            bytes: [0; MAX_DATA_LENGTH],
        })
    }

    pub fn len(&self) -> usize {
        usize::from(self.length)
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }
}

impl Default for Data {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl core::ops::Deref for Data {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.bytes[..self.len()]
    }
}

impl core::ops::DerefMut for Data {
    fn deref_mut(&mut self) -> &mut Self::Target {
        let length = self.len();
        &mut self.bytes[..length]
    }
}

/// Frame as exchanged with the bus driver, before protocol decoding
///
/// Remote frames carry a requested length but no data bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawFrame {
    id: Id,
    data: Data,
    remote: bool,
}

impl RawFrame {
    pub fn new_standard(id: StandardId, data: Data) -> Self {
        Self {
            id: Id::Standard(id),
            data,
            remote: false,
        }
    }

    pub fn new_extended(id: ExtendedId, data: Data) -> Self {
        Self {
            id: Id::Extended(id),
            data,
            remote: false,
        }
    }

    /// Copies any HAL frame into the driver-neutral representation.
    pub fn from_frame(frame: &impl embedded_can::Frame) -> Option<Self> {
        if frame.is_remote_frame() {
            <Self as embedded_can::Frame>::new_remote(frame.id(), frame.dlc())
        } else {
            <Self as embedded_can::Frame>::new(frame.id(), frame.data())
        }
    }

    pub fn payload(&self) -> &Data {
        &self.data
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for RawFrame {
    fn format(&self, fmt: defmt::Formatter) {
        let (raw_id, extended) = match self.id {
            Id::Standard(id) => (u32::from(id.as_raw()), false),
            Id::Extended(id) => (id.as_raw(), true),
        };
        defmt::write!(
            fmt,
            "RawFrame {{ id: {=u32:#x}, extended: {}, remote: {}, data: {} }}",
            raw_id,
            extended,
            self.remote,
            self.data
        )
    }
}

impl embedded_can::Frame for RawFrame {
    fn new(id: impl Into<Id>, data: &[u8]) -> Option<Self> {
        let data = Data::new(data).ok()?;
        Some(Self {
            id: id.into(),
            data,
            remote: false,
        })
    }

    fn new_remote(id: impl Into<Id>, dlc: usize) -> Option<Self> {
        let data = Data::new_zeros(dlc).ok()?;
        Some(Self {
            id: id.into(),
            data,
            remote: true,
        })
    }

    fn is_extended(&self) -> bool {
        matches!(self.id, Id::Extended(_))
    }

    fn is_remote_frame(&self) -> bool {
        self.remote
    }

    fn id(&self) -> Id {
        self.id
    }

    fn dlc(&self) -> usize {
        self.data.len()
    }

    fn data(&self) -> &[u8] {
        if self.remote { &[] } else { &self.data }
    }
}
