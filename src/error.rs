//! Custom error types for the crate.
//!
//! `StageError` is the single error type returned by every stage operation.
//! Built on `thiserror`, it separates the failures a caller can act on:
//!
//! - **`DeviceNotFound`**: discovery exhausted every candidate (no handle, no
//!   matching serial port, no USB controller). Construction fails fast and no
//!   controller is returned.
//! - **`Transport`**: a single candidate port failed during open, write or
//!   read. Discovery recovers from this locally by skipping the port; it only
//!   reaches a caller through `move_to`.
//! - **`Serial`** / **`Io`**: errors from the `serialport` crate and the
//!   standard I/O layer underneath it.
//! - **`Vendor`**: a vendor library call returned a failure code.
//! - **`Config`** / **`ConfigValidation`**: settings could not be loaded or
//!   hold values that cannot work.
//! - **`FeatureNotEnabled`**: a backend was requested that was not compiled in.

use crate::stage::StageKind;
use thiserror::Error;

/// Convenience alias for results using the crate error type.
pub type StageResult<T> = std::result::Result<T, StageError>;

/// Errors raised while discovering, initializing or moving a stage.
#[derive(Error, Debug)]
pub enum StageError {
    /// Discovery found no usable device.
    #[error("No {kind} stage found: {reason}")]
    DeviceNotFound {
        /// Kind that was being opened.
        kind: StageKind,
        /// What the discovery attempt saw.
        reason: String,
    },

    /// Open, write or read failed on a transport.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Error from the serial backend.
    #[cfg(feature = "instrument_serial")]
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// Underlying I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A vendor library call reported failure.
    #[error("{call} failed with code {code}")]
    Vendor {
        /// Library function name.
        call: &'static str,
        /// Code returned or reported by the library.
        code: i32,
    },

    /// Settings could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] Box<figment::Error>),

    /// Settings loaded but hold unusable values.
    #[error("Configuration validation error: {0}")]
    ConfigValidation(String),

    /// Backend not compiled into this build.
    #[error("Feature '{0}' is not enabled. Please build with --features {0}")]
    FeatureNotEnabled(String),
}

impl StageError {
    pub(crate) fn not_found(kind: StageKind, reason: impl Into<String>) -> Self {
        StageError::DeviceNotFound {
            kind,
            reason: reason.into(),
        }
    }
}

impl From<figment::Error> for StageError {
    fn from(err: figment::Error) -> Self {
        StageError::Config(Box::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StageError::not_found(StageKind::SingleAxisSerial, "no port answered E516");
        assert_eq!(
            err.to_string(),
            "No single-axis stage found: no port answered E516"
        );
    }

    #[test]
    fn test_vendor_error_display() {
        let err = StageError::Vendor {
            call: "MCL_SingleWriteN",
            code: -7,
        };
        assert_eq!(err.to_string(), "MCL_SingleWriteN failed with code -7");
    }

    #[test]
    fn test_feature_error_mentions_flag() {
        let err = StageError::FeatureNotEnabled("pi_hardware".into());
        assert!(err.to_string().contains("--features pi_hardware"));
    }
}
