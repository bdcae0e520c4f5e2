use super::{SerialLink, SerialPortProvider};
use crate::error::{StageError, StageResult};
use log::debug;
use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};
use std::io::{ErrorKind, Read, Write};
use std::time::Duration;

/// Serial adapter for RS-232 communication
///
/// Wraps a port opened through the serialport crate. The port is closed when
/// the adapter is dropped.
pub struct SerialAdapter {
    /// Port name (e.g., "/dev/ttyUSB0", "COM3")
    port_name: String,

    /// Baud rate (e.g., 9600, 115200)
    baud_rate: u32,

    port: Box<dyn SerialPort>,
}

impl SerialAdapter {
    /// Open `port_name` with the line settings every PI controller here uses.
    ///
    /// # Arguments
    /// * `port_name` - Serial port path (e.g., "/dev/ttyUSB0", "COM3")
    /// * `baud_rate` - Communication speed (e.g., 9600, 115200)
    /// * `read_timeout` - Timeout applied to each read call
    ///
    /// # Errors
    /// Returns `StageError::Serial` if the port cannot be opened.
    pub fn open(port_name: &str, baud_rate: u32, read_timeout: Duration) -> StageResult<Self> {
        let port = serialport::new(port_name, baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(read_timeout)
            .open()?;

        debug!("Serial port '{}' opened at {} baud", port_name, baud_rate);

        Ok(Self {
            port_name: port_name.to_string(),
            baud_rate,
            port,
        })
    }
}

impl SerialLink for SerialAdapter {
    fn port_name(&self) -> &str {
        &self.port_name
    }

    fn write_str(&mut self, data: &str) -> StageResult<()> {
        self.port.write_all(data.as_bytes())?;
        self.port.flush()?;
        debug!("[{}] Sent: {}", self.port_name, data.trim_end());
        Ok(())
    }

    fn read_existing(&mut self) -> StageResult<String> {
        let available = self.port.bytes_to_read()? as usize;
        if available == 0 {
            return Ok(String::new());
        }

        let mut buffer = vec![0u8; available];
        let mut filled = 0;
        while filled < available {
            match self.port.read(&mut buffer[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                // Bytes counted by the driver may not all be readable yet
                Err(e) if e.kind() == ErrorKind::TimedOut => break,
                Err(e) => return Err(StageError::Io(e)),
            }
        }

        let response = String::from_utf8_lossy(&buffer[..filled]).into_owned();
        debug!("[{}] Received: {:?}", self.port_name, response);
        Ok(response)
    }
}

impl Drop for SerialAdapter {
    fn drop(&mut self) {
        debug!(
            "Serial port '{}' ({} baud) closed",
            self.port_name, self.baud_rate
        );
    }
}

/// Serial ports of the host machine.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemSerial;

impl SerialPortProvider for SystemSerial {
    fn port_names(&self) -> StageResult<Vec<String>> {
        let ports = serialport::available_ports()?;
        Ok(ports.into_iter().map(|p| p.port_name).collect())
    }

    fn open(
        &self,
        port_name: &str,
        baud_rate: u32,
        read_timeout: Duration,
    ) -> StageResult<Box<dyn SerialLink>> {
        let adapter = SerialAdapter::open(port_name, baud_rate, read_timeout)?;
        Ok(Box::new(adapter))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_missing_port_fails() {
        let result = SerialAdapter::open(
            "/dev/this-port-does-not-exist",
            9600,
            Duration::from_millis(10),
        );
        assert!(matches!(result, Err(StageError::Serial(_))));
    }

    #[test]
    fn test_system_provider_open_reports_errors() {
        let provider = SystemSerial;
        assert!(provider
            .open("/dev/this-port-does-not-exist", 115_200, Duration::from_millis(10))
            .is_err());
    }
}
