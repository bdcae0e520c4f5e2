//! Stage settings loaded through Figment.
//!
//! Settings are layered in this order of precedence (highest to lowest):
//! 1. Environment variables (`STAGE_` prefix, `__` separates sections)
//! 2. An optional TOML file
//! 3. Built-in defaults
//!
//! # Environment Variable Overrides
//!
//! ```text
//! STAGE_SERIAL__IDENTIFY_DELAY_MS=300
//! STAGE_SERIAL__PORTS='["/dev/ttyUSB0"]'
//! STAGE_NANOSTAGE__USB_FILTER="PI E-712"
//! ```
//!
//! # Example
//!
//! ```toml
//! [serial]
//! identify_delay_ms = 200
//! command_delay_ms = 100
//! read_timeout_ms = 100
//! ports = ["COM3", "COM4"]
//!
//! [nanostage]
//! usb_filter = "PI E-712"
//! ```

use crate::error::{StageError, StageResult};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Environment variable prefix for overrides.
pub const ENV_PREFIX: &str = "STAGE_";

/// Top-level settings for opening stages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageSettings {
    /// Serial discovery and initialization timing.
    pub serial: SerialSettings,
    /// USB nanostage discovery.
    pub nanostage: NanostageSettings,
}

/// Timing and port selection for the serial-line stages.
///
/// The delays stand in for acknowledgments the controllers never send back:
/// after writing `*IDN?` the driver waits `identify_delay_ms` before reading,
/// and after every setup command it waits `command_delay_ms`. Nothing confirms
/// the controller actually processed a command in that time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialSettings {
    /// Wait between the identification query and reading the reply.
    pub identify_delay_ms: u64,
    /// Pause after each initialization command.
    pub command_delay_ms: u64,
    /// Read timeout of the underlying port.
    pub read_timeout_ms: u64,
    /// Ports to probe, in order. Empty means every port the host reports.
    pub ports: Vec<String>,
}

impl Default for SerialSettings {
    fn default() -> Self {
        Self {
            identify_delay_ms: 200,
            command_delay_ms: 100,
            read_timeout_ms: 100,
            ports: Vec::new(),
        }
    }
}

impl SerialSettings {
    /// Identification delay as a `Duration`.
    pub fn identify_delay(&self) -> Duration {
        Duration::from_millis(self.identify_delay_ms)
    }

    /// Command delay as a `Duration`.
    pub fn command_delay(&self) -> Duration {
        Duration::from_millis(self.command_delay_ms)
    }

    /// Port read timeout as a `Duration`.
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

/// USB discovery of the XYZ nanostage controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NanostageSettings {
    /// Product-name filter passed to USB enumeration.
    pub usb_filter: String,
}

impl Default for NanostageSettings {
    fn default() -> Self {
        Self {
            usb_filter: "PI E-712".to_string(),
        }
    }
}

impl StageSettings {
    /// Load defaults merged with `STAGE_` environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if an override cannot be parsed or validation fails.
    pub fn load() -> StageResult<Self> {
        Self::from_figment(Self::base_figment())
    }

    /// Load settings from a TOML file, then apply environment overrides.
    ///
    /// A missing file is not an error; defaults are used for anything it
    /// would have set.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is malformed or validation fails.
    pub fn load_from<P: AsRef<Path>>(path: P) -> StageResult<Self> {
        let figment = Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));
        Self::from_figment(figment)
    }

    fn base_figment() -> Figment {
        Figment::from(Serialized::defaults(Self::default()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    fn from_figment(figment: Figment) -> StageResult<Self> {
        let settings: Self = figment.extract()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Validate settings after loading.
    ///
    /// Checks:
    /// - The serial read timeout is non-zero (a zero timeout makes every read fail)
    /// - The USB filter is not empty
    ///
    /// # Errors
    ///
    /// Returns `StageError::ConfigValidation` describing the first failure.
    pub fn validate(&self) -> StageResult<()> {
        if self.serial.read_timeout_ms == 0 {
            return Err(StageError::ConfigValidation(
                "serial.read_timeout_ms must be greater than 0".to_string(),
            ));
        }
        if self.nanostage.usb_filter.trim().is_empty() {
            return Err(StageError::ConfigValidation(
                "nanostage.usb_filter must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_match_firmware_timing() {
        let settings = StageSettings::default();
        assert_eq!(settings.serial.identify_delay(), Duration::from_millis(200));
        assert_eq!(settings.serial.command_delay(), Duration::from_millis(100));
        assert!(settings.serial.ports.is_empty());
        assert_eq!(settings.nanostage.usb_filter, "PI E-712");
    }

    #[test]
    #[serial]
    fn test_load_from_file_overrides_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[serial]
identify_delay_ms = 350
ports = ["COM3", "COM7"]
"#
        )
        .unwrap();

        let settings = StageSettings::load_from(file.path()).unwrap();
        assert_eq!(settings.serial.identify_delay_ms, 350);
        assert_eq!(settings.serial.command_delay_ms, 100);
        assert_eq!(settings.serial.ports, vec!["COM3", "COM7"]);
    }

    #[test]
    #[serial]
    fn test_missing_file_uses_defaults() {
        let settings = StageSettings::load_from("/nonexistent/stage.toml").unwrap();
        assert_eq!(settings, StageSettings::default());
    }

    #[test]
    #[serial]
    fn test_env_overrides_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "stage.toml",
                r#"
[serial]
command_delay_ms = 50
"#,
            )?;
            jail.set_env("STAGE_SERIAL__COMMAND_DELAY_MS", "25");
            jail.set_env("STAGE_NANOSTAGE__USB_FILTER", "PI E-727");

            let settings = StageSettings::load_from("stage.toml").map_err(|e| e.to_string())?;
            assert_eq!(settings.serial.command_delay_ms, 25);
            assert_eq!(settings.nanostage.usb_filter, "PI E-727");
            Ok(())
        });
    }

    #[test]
    fn test_validation_rejects_zero_timeout() {
        let mut settings = StageSettings::default();
        settings.serial.read_timeout_ms = 0;
        assert!(matches!(
            settings.validate(),
            Err(StageError::ConfigValidation(_))
        ));
    }

    #[test]
    fn test_validation_rejects_empty_filter() {
        let mut settings = StageSettings::default();
        settings.nanostage.usb_filter = "  ".into();
        assert!(settings.validate().is_err());
    }
}
