//! Serial port discovery
//!
//! PI serial controllers are found by brute force: open every candidate port
//! with the controller's line settings, send `*IDN?`, wait a fixed delay and
//! look for the model string in whatever came back. The first port that
//! matches and accepts its initialization sequence wins.
//!
//! A candidate that cannot be opened, written, read or initialized is closed
//! and skipped; those failures never abort the scan.

use crate::adapters::{SerialLink, SerialPortProvider};
use crate::commands::IDENTIFY;
use crate::config::SerialSettings;
use crate::error::StageResult;
use log::{debug, info, warn};
use std::thread;

/// Rule deciding whether an identification reply belongs to the wanted model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityMatch {
    /// The reply starts with the given characters.
    Prefix(&'static str),
    /// The reply contains the given text anywhere.
    Contains(&'static str),
}

impl IdentityMatch {
    /// Check an identification reply.
    pub fn matches(&self, reply: &str) -> bool {
        match self {
            IdentityMatch::Prefix(model) => reply.starts_with(model),
            IdentityMatch::Contains(model) => reply.contains(model),
        }
    }
}

/// Send the identification query and return the raw reply.
///
/// The controller never signals the end of its reply, so this sleeps for the
/// configured identification delay and takes whatever has arrived.
pub fn identify(link: &mut dyn SerialLink, settings: &SerialSettings) -> StageResult<String> {
    link.write_str(IDENTIFY)?;
    thread::sleep(settings.identify_delay());
    let reply = link.read_existing()?;
    debug!("[{}] *IDN? -> {:?}", link.port_name(), reply);
    Ok(reply)
}

/// Port names to probe: the configured list, or everything the host reports.
pub fn candidate_ports(
    provider: &dyn SerialPortProvider,
    settings: &SerialSettings,
) -> StageResult<Vec<String>> {
    if settings.ports.is_empty() {
        provider.port_names()
    } else {
        Ok(settings.ports.clone())
    }
}

/// Scan candidate ports for a controller and initialize the first match.
///
/// `initialize` runs on the matching link; if it fails the port is closed and
/// the scan continues with the next candidate.
///
/// Returns `Ok(None)` when every candidate was exhausted without a match.
///
/// # Errors
/// Only enumeration failures are returned; per-port failures are logged and
/// skipped.
pub fn find_port<F>(
    provider: &dyn SerialPortProvider,
    settings: &SerialSettings,
    baud_rate: u32,
    identity: IdentityMatch,
    mut initialize: F,
) -> StageResult<Option<Box<dyn SerialLink>>>
where
    F: FnMut(&mut dyn SerialLink) -> StageResult<()>,
{
    for port_name in candidate_ports(provider, settings)? {
        let result = provider
            .open(&port_name, baud_rate, settings.read_timeout())
            .and_then(|mut link| {
                let reply = identify(link.as_mut(), settings)?;
                if !identity.matches(&reply) {
                    return Ok(None);
                }
                initialize(link.as_mut())?;
                Ok(Some(link))
            });

        match result {
            Ok(Some(link)) => {
                info!("Found {:?} on {} at {} baud", identity, port_name, baud_rate);
                return Ok(Some(link));
            }
            Ok(None) => debug!("{}: no match for {:?}", port_name, identity),
            Err(e) => warn!("Skipping {}: {}", port_name, e),
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{MockPort, MockSerialProvider};

    fn fast_settings() -> SerialSettings {
        SerialSettings {
            identify_delay_ms: 0,
            command_delay_ms: 0,
            ..SerialSettings::default()
        }
    }

    #[test]
    fn test_prefix_needs_first_four_characters() {
        let rule = IdentityMatch::Prefix("E516");
        assert!(rule.matches("E516,PI,E-516,1.0"));
        assert!(!rule.matches(" E516"));
        assert!(!rule.matches("E51"));
        assert!(!rule.matches(""));
    }

    #[test]
    fn test_contains_matches_anywhere() {
        let rule = IdentityMatch::Contains("E-517");
        assert!(rule.matches("(c)2015 Physik Instrumente(PI) Karlsruhe, E-517, 0, V1.0"));
        assert!(!rule.matches("E517"));
    }

    #[test]
    fn test_configured_ports_replace_enumeration() {
        let provider = MockSerialProvider::new().with_enumeration_failure();
        let settings = SerialSettings {
            ports: vec!["COM5".into()],
            ..fast_settings()
        };
        assert_eq!(candidate_ports(&provider, &settings).unwrap(), vec!["COM5"]);
        assert!(candidate_ports(&provider, &fast_settings()).is_err());
    }

    #[test]
    fn test_scan_stops_at_first_match() {
        let provider = MockSerialProvider::new()
            .with_port("COM1", MockPort::silent())
            .with_port("COM2", MockPort::responding("E516"))
            .with_port("COM3", MockPort::responding("E516"));

        let link = find_port(
            &provider,
            &fast_settings(),
            9600,
            IdentityMatch::Prefix("E516"),
            |_| Ok(()),
        )
        .unwrap()
        .unwrap();

        assert_eq!(link.port_name(), "COM2");
        assert_eq!(provider.activity("COM1").closed, 1);
        assert_eq!(provider.activity("COM3").opened, 0);
    }

    #[test]
    fn test_failed_initialization_moves_on() {
        let provider = MockSerialProvider::new()
            .with_port("COM1", MockPort::responding("E516").failing_writes_after(2))
            .with_port("COM2", MockPort::responding("E516"));

        let link = find_port(
            &provider,
            &fast_settings(),
            9600,
            IdentityMatch::Prefix("E516"),
            |link| {
                link.write_str("ONL 1\n")?;
                link.write_str("VCO A1\n")
            },
        )
        .unwrap()
        .unwrap();

        assert_eq!(link.port_name(), "COM2");
        let skipped = provider.activity("COM1");
        assert_eq!((skipped.opened, skipped.closed), (1, 1));
    }

    #[test]
    fn test_exhausted_scan_returns_none() {
        let provider = MockSerialProvider::new()
            .with_port("COM1", MockPort::failing_open())
            .with_port("COM2", MockPort::responding("garbage").with_read_failure());

        let found = find_port(
            &provider,
            &fast_settings(),
            115_200,
            IdentityMatch::Contains("E-517"),
            |_| Ok(()),
        )
        .unwrap();

        assert!(found.is_none());
        assert_eq!(provider.open_links(), 0);
    }
}
