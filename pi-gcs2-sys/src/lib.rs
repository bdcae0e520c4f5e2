//! Raw bindings to the Physik Instrumente GCS2 library (`PI_GCS2_DLL`).
//!
//! Covers USB enumeration, connection management and the `ONL`/`SVO`/`MOV`
//! commands. Enable the `pi-gcs2-sdk` feature to link against the library.
//!
//! Functions returning `BOOL` use a non-zero value for success; the reason for
//! a failure is available from `PI_GetError`.

#![allow(non_snake_case)]

/// GCS `BOOL`.
pub type BOOL = i32;

/// `TRUE` as used by the GCS library.
pub const TRUE: BOOL = 1;
/// `FALSE` as used by the GCS library.
pub const FALSE: BOOL = 0;

#[cfg(feature = "pi-gcs2-sdk")]
use std::os::raw::{c_char, c_double, c_int};

#[cfg(feature = "pi-gcs2-sdk")]
extern "C" {
    /// Write a newline-separated list of USB controllers matching `szFilter`
    /// into `szBuffer`. Returns the number of controllers found, or a negative
    /// error code.
    pub fn PI_EnumerateUSB(szBuffer: *mut c_char, iBufferSize: c_int, szFilter: *const c_char)
        -> c_int;

    /// Open a connection to the controller described by `szDescription`.
    /// Returns the connection id, negative on failure.
    pub fn PI_ConnectUSB(szDescription: *const c_char) -> c_int;

    /// Close connection `ID`.
    pub fn PI_CloseConnection(ID: c_int);

    /// Error code of the last failing call on connection `ID`.
    pub fn PI_GetError(ID: c_int) -> c_int;

    /// Set online mode of the given piezo channels.
    pub fn PI_ONL(
        ID: c_int,
        iPiezoChannels: *const c_int,
        iValues: *const c_int,
        iArraySize: c_int,
    ) -> BOOL;

    /// Set servo mode of the axes named in `szAxes`.
    pub fn PI_SVO(ID: c_int, szAxes: *const c_char, pbValueArray: *const BOOL) -> BOOL;

    /// Move the axes named in `szAxes` to absolute targets.
    pub fn PI_MOV(ID: c_int, szAxes: *const c_char, pdValueArray: *const c_double) -> BOOL;
}
