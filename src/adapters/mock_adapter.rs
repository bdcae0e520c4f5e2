//! Scripted serial ports for testing
//!
//! [`MockSerialProvider`] hands out ports that answer the identification
//! query with a canned string and record everything written to them. It
//! provides:
//! - Per-port identification replies
//! - Failure injection on open, write and read
//! - Open/close counting and a write log for test verification
//!
//! # Example
//!
//! ```
//! use stage_control::adapters::{MockPort, MockSerialProvider};
//!
//! let provider = MockSerialProvider::new()
//!     .with_port("COM1", MockPort::silent())
//!     .with_port("COM3", MockPort::responding("E516,PI,E-516,1.0"));
//!
//! assert_eq!(provider.activity("COM3").opened, 0);
//! ```

use super::{SerialLink, SerialPortProvider};
use crate::commands::IDENTIFY;
use crate::error::{StageError, StageResult};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Behaviour of one scripted port.
#[derive(Debug, Clone, Default)]
pub struct MockPort {
    reply: String,
    fail_open: bool,
    fail_read: bool,
    /// Writes that succeed before every further write fails.
    writes_before_failure: Option<usize>,
}

impl MockPort {
    /// A port that answers `*IDN?` with `reply`.
    pub fn responding(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            ..Self::default()
        }
    }

    /// A port that never answers.
    pub fn silent() -> Self {
        Self::default()
    }

    /// A port that cannot be opened.
    pub fn failing_open() -> Self {
        Self {
            fail_open: true,
            ..Self::default()
        }
    }

    /// Fail every read.
    pub fn with_read_failure(mut self) -> Self {
        self.fail_read = true;
        self
    }

    /// Let `count` writes through, then fail the rest.
    pub fn failing_writes_after(mut self, count: usize) -> Self {
        self.writes_before_failure = Some(count);
        self
    }
}

/// What happened on one port name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PortActivity {
    /// Successful opens.
    pub opened: usize,
    /// Links dropped after a successful open.
    pub closed: usize,
    /// Baud rate of every successful open.
    pub baud_rates: Vec<u32>,
    /// Every successful write, in order, across all opens.
    pub writes: Vec<String>,
}

type ActivityLog = Arc<Mutex<HashMap<String, PortActivity>>>;

fn lock(log: &ActivityLog) -> MutexGuard<'_, HashMap<String, PortActivity>> {
    log.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Provider of scripted ports, enumerated in insertion order.
#[derive(Debug, Clone, Default)]
pub struct MockSerialProvider {
    ports: Vec<(String, MockPort)>,
    fail_enumeration: bool,
    log: ActivityLog,
}

impl MockSerialProvider {
    /// An empty provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a port.
    pub fn with_port(mut self, name: impl Into<String>, port: MockPort) -> Self {
        self.ports.push((name.into(), port));
        self
    }

    /// Make enumeration itself fail.
    pub fn with_enumeration_failure(mut self) -> Self {
        self.fail_enumeration = true;
        self
    }

    /// Snapshot of the activity recorded for `port_name`.
    pub fn activity(&self, port_name: &str) -> PortActivity {
        lock(&self.log).get(port_name).cloned().unwrap_or_default()
    }

    /// Total number of links currently open across all ports.
    pub fn open_links(&self) -> usize {
        lock(&self.log)
            .values()
            .map(|a| a.opened - a.closed)
            .sum()
    }
}

impl SerialPortProvider for MockSerialProvider {
    fn port_names(&self) -> StageResult<Vec<String>> {
        if self.fail_enumeration {
            return Err(StageError::Transport("port enumeration failed".into()));
        }
        Ok(self.ports.iter().map(|(name, _)| name.clone()).collect())
    }

    fn open(
        &self,
        port_name: &str,
        baud_rate: u32,
        _read_timeout: Duration,
    ) -> StageResult<Box<dyn SerialLink>> {
        let script = self
            .ports
            .iter()
            .find(|(name, _)| name == port_name)
            .map(|(_, port)| port.clone())
            .ok_or_else(|| StageError::Transport(format!("no such port '{}'", port_name)))?;

        if script.fail_open {
            return Err(StageError::Transport(format!(
                "access to '{}' denied",
                port_name
            )));
        }

        {
            let mut log = lock(&self.log);
            let activity = log.entry(port_name.to_string()).or_default();
            activity.opened += 1;
            activity.baud_rates.push(baud_rate);
        }

        Ok(Box::new(MockSerialLink {
            port_name: port_name.to_string(),
            script,
            pending: String::new(),
            writes: 0,
            log: Arc::clone(&self.log),
        }))
    }
}

struct MockSerialLink {
    port_name: String,
    script: MockPort,
    pending: String,
    writes: usize,
    log: ActivityLog,
}

impl SerialLink for MockSerialLink {
    fn port_name(&self) -> &str {
        &self.port_name
    }

    fn write_str(&mut self, data: &str) -> StageResult<()> {
        if let Some(limit) = self.script.writes_before_failure {
            if self.writes >= limit {
                return Err(StageError::Transport(format!(
                    "write to '{}' failed",
                    self.port_name
                )));
            }
        }
        self.writes += 1;

        if data == IDENTIFY {
            self.pending.push_str(&self.script.reply);
        }
        lock(&self.log)
            .entry(self.port_name.clone())
            .or_default()
            .writes
            .push(data.to_string());
        Ok(())
    }

    fn read_existing(&mut self) -> StageResult<String> {
        if self.script.fail_read {
            return Err(StageError::Transport(format!(
                "read from '{}' failed",
                self.port_name
            )));
        }
        Ok(std::mem::take(&mut self.pending))
    }
}

impl Drop for MockSerialLink {
    fn drop(&mut self) {
        lock(&self.log)
            .entry(self.port_name.clone())
            .or_default()
            .closed += 1;
    }
}
