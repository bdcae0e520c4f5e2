//! Core library for driving precision stages.
//!
//! This library opens and moves four kinds of motorized stages: a Mad City
//! Labs piezo focus actuator, a PI E-516 single-axis nanopositioner, a PI
//! E-712 XYZ nanopositioner and a PI E-517 piezo mirror. Serial-line stages
//! are discovered by probing ports with `*IDN?`; the others go through their
//! vendor libraries. It is used by the `stagectl` tool and by applications
//! embedding the stages.

pub mod adapters;
pub mod commands;
pub mod config;
pub mod discovery;
pub mod error;
pub mod stage;
pub mod vendor;

pub use config::StageSettings;
pub use error::{StageError, StageResult};
pub use stage::{Position, StageController, StageKind};
