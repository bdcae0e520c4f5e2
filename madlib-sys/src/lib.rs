//! Raw bindings to the Mad City Labs Madlib focus-controller library.
//!
//! Only the handful of calls needed to drive a single-axis focus actuator are
//! declared. Enable the `madlib-sdk` feature to link against the library;
//! without it this crate is empty so dependents still compile.
//!
//! Return conventions (from the Madlib manual):
//! - `MCL_InitHandle` returns 0 when no device could be acquired.
//! - Functions returning `c_int` use `MCL_SUCCESS` (0) and negative error codes.
//! - `MCL_GetCalibration` returns the calibrated range, or a negative error code.

#![allow(non_snake_case)]

/// Success return code.
pub const MCL_SUCCESS: i32 = 0;
/// Generic error.
pub const MCL_GENERAL_ERROR: i32 = -1;
/// Device error.
pub const MCL_DEV_ERROR: i32 = -2;
/// Device not attached.
pub const MCL_DEV_NOT_ATTACHED: i32 = -3;
/// Usage error.
pub const MCL_USAGE_ERROR: i32 = -4;
/// Device not ready.
pub const MCL_DEV_NOT_READY: i32 = -5;
/// Argument error.
pub const MCL_ARGUMENT_ERROR: i32 = -6;
/// Invalid axis.
pub const MCL_INVALID_AXIS: i32 = -7;
/// Invalid handle.
pub const MCL_INVALID_HANDLE: i32 = -8;

#[cfg(feature = "madlib-sdk")]
use std::os::raw::{c_double, c_int, c_uint};

#[cfg(feature = "madlib-sdk")]
extern "C" {
    /// Acquire a handle to the first available device. Returns 0 on failure.
    pub fn MCL_InitHandle() -> c_int;

    /// Calibrated range of `axis` in micrometres.
    pub fn MCL_GetCalibration(axis: c_uint, handle: c_int) -> c_double;

    /// Command `axis` to `position`. Blocks until the write is issued.
    pub fn MCL_SingleWriteN(position: c_double, axis: c_uint, handle: c_int) -> c_int;

    /// Release every handle held by this process.
    pub fn MCL_ReleaseAllHandles();
}
