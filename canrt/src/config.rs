use crate::core::{BaudRate, NmtState, NodeId};
use crate::time::Duration;

/// Startup parameters of the node
///
/// Supplied once when the runtime is built and never changed afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    /// Address of this node. The heartbeat is published on `0x700 + node_id`.
    pub node_id: NodeId,
    /// Bus bit rate. The runtime only reports it; the driver configures the peripheral.
    pub baud_rate: BaudRate,
    /// NMT state announced in heartbeats until changed
    pub initial_state: NmtState,
    /// Heartbeat trigger period
    pub heartbeat_period: Duration,
    /// Transmit flush trigger period
    pub tx_flush_period: Duration,
    /// Receive poll trigger period. Must drain the driver before its receive FIFO overflows.
    pub rx_poll_period: Duration,
    /// Foreground diagnostic report period
    pub report_period: Duration,
}

impl Config {
    pub const DEFAULT_HEARTBEAT_PERIOD: Duration = Duration::from_secs(1);
    pub const DEFAULT_TX_FLUSH_PERIOD: Duration = Duration::from_millis(20);
    pub const DEFAULT_RX_POLL_PERIOD: Duration = Duration::from_millis(3);
    pub const DEFAULT_REPORT_PERIOD: Duration = Duration::from_millis(250);

    pub const fn new(node_id: NodeId, baud_rate: BaudRate) -> Self {
        Self {
            node_id,
            baud_rate,
            initial_state: NmtState::Operational,
            heartbeat_period: Self::DEFAULT_HEARTBEAT_PERIOD,
            tx_flush_period: Self::DEFAULT_TX_FLUSH_PERIOD,
            rx_poll_period: Self::DEFAULT_RX_POLL_PERIOD,
            report_period: Self::DEFAULT_REPORT_PERIOD,
        }
    }
}
