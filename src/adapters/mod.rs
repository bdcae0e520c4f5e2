//! Serial transport adapters
//!
//! Stages that speak PI GCS over RS-232 only need three things from a port:
//! enumerate candidates, open one with fixed line settings, then write text
//! and read whatever has arrived. [`SerialPortProvider`] and [`SerialLink`]
//! capture exactly that, so discovery and the stage logic run unchanged
//! against real hardware ([`SystemSerial`]) or a scripted port
//! ([`MockSerialProvider`]).
//!
//! Every link is exclusively owned. Dropping a link closes the port.

pub mod mock_adapter;
#[cfg(feature = "instrument_serial")]
pub mod serial_adapter;

pub use mock_adapter::{MockPort, MockSerialProvider, PortActivity};
#[cfg(feature = "instrument_serial")]
pub use serial_adapter::{SerialAdapter, SystemSerial};

use crate::error::StageResult;
use std::time::Duration;

/// An open serial connection, configured 8-N-1 without flow control.
pub trait SerialLink: Send {
    /// Name the port was opened under (e.g. "COM3", "/dev/ttyUSB0").
    fn port_name(&self) -> &str;

    /// Write `data` verbatim. No terminator is appended.
    fn write_str(&mut self, data: &str) -> StageResult<()>;

    /// Return everything currently buffered without waiting for more.
    fn read_existing(&mut self) -> StageResult<String>;
}

/// Source of serial ports: enumeration plus opening.
pub trait SerialPortProvider {
    /// Names of the ports visible to the host, in probe order.
    fn port_names(&self) -> StageResult<Vec<String>>;

    /// Open `port_name` at `baud_rate`, 8 data bits, no parity, one stop
    /// bit, no flow control.
    fn open(
        &self,
        port_name: &str,
        baud_rate: u32,
        read_timeout: Duration,
    ) -> StageResult<Box<dyn SerialLink>>;
}
