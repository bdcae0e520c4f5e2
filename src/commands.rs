//! PI GCS ASCII commands used on the serial-line stages.
//!
//! Every command is a newline-terminated string written verbatim to the port.
//! There is no checksum and the controllers are never asked to acknowledge;
//! the only reply ever read is the answer to [`IDENTIFY`].

/// Identification query.
pub const IDENTIFY: &str = "*IDN?\n";

/// E-516 line speed.
pub const SINGLE_AXIS_BAUD: u32 = 9600;

/// E-517 line speed.
pub const PIEZO_MIRROR_BAUD: u32 = 115_200;

/// Identification prefix reported by the E-516 single-axis controller.
pub const SINGLE_AXIS_MODEL: &str = "E516";

/// Model string reported somewhere in the E-517 piezo mirror identification.
pub const PIEZO_MIRROR_MODEL: &str = "E-517";

/// E-516 initialization, sent in order with a pause after each command.
pub const SINGLE_AXIS_SETUP: [&str; 4] = [
    "ONL 1\n",    // controller online
    "VCO A1\n",   // velocity control on axis A
    "VEL A100\n", // velocity 100 um/s
    "NLM A19\n",  // negative soft limit
];

/// E-516 home move issued once the setup sequence is done.
pub const SINGLE_AXIS_HOME: &str = "MOV A60.00\n";

/// Z position the E-516 is homed to.
pub const SINGLE_AXIS_HOME_Z: f64 = 60.0;

/// E-517 initialization, sent in order with a pause after each command.
pub const PIEZO_MIRROR_SETUP: [&str; 3] = ["ONL 1 1 2 1\n", "SVO 1 1 2 1\n", "MOV 1 0 2 0\n"];

/// Render a position with exactly three decimals.
pub fn format_position(distance: f64) -> String {
    format!("{:.3}", distance)
}

/// Absolute move of E-516 axis A.
pub fn single_axis_move(distance: f64) -> String {
    format!("MOV A{}\n", format_position(distance))
}

/// Axis selector sent ahead of an E-517 move value. Axis 1 is theta; every
/// other value addresses axis 2 (phi).
pub fn piezo_mirror_move_prefix(axis: u32) -> &'static str {
    if axis == 1 {
        "MOV 1 "
    } else {
        "MOV 2 "
    }
}

/// Move value that completes an E-517 move command.
pub fn piezo_mirror_move_value(distance: f64) -> String {
    format!("{}\n", format_position(distance))
}
