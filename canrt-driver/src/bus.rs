//! Interface the runtime uses to reach the CAN peripheral

use crate::frame::RawFrame;

/// Non-blocking CAN peripheral access
///
/// The runtime calls both methods from timer interrupt handlers: `transmit` from the
/// transmit-flush trigger and `receive` from the receive-poll trigger. Implementations must
/// return immediately and must not wait for bus activity.
///
/// Arbitration, retransmission and error confinement stay inside the driver. The runtime
/// does not retry a failed transmission.
pub trait BusDriver {
    type Error;

    /// Hands the frame over to the peripheral for transmission.
    ///
    /// An error means the frame was not accepted, e.g., all mailboxes are occupied or the
    /// controller is bus-off.
    fn transmit(&mut self, frame: &RawFrame) -> Result<(), Self::Error>;

    /// Fetches the next received frame, if any.
    ///
    /// The runtime keeps calling until `None` is returned.
    fn receive(&mut self) -> Option<RawFrame>;
}

impl<T: BusDriver + ?Sized> BusDriver for &mut T {
    type Error = T::Error;

    fn transmit(&mut self, frame: &RawFrame) -> Result<(), Self::Error> {
        T::transmit(self, frame)
    }

    fn receive(&mut self) -> Option<RawFrame> {
        T::receive(self)
    }
}
