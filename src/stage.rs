//! Stage controller
//!
//! [`StageController`] drives one physical stage of one of four kinds:
//!
//! | Kind | Transport | Axes |
//! |---|---|---|
//! | [`StageKind::CryoFocus`] | Madlib handle | Z (3) |
//! | [`StageKind::SingleAxisSerial`] | serial 9600 8-N-1, PI E-516 | Z (3) |
//! | [`StageKind::XyzNanostage`] | PI GCS2 over USB, E-712 | X (1), Y (2), Z (3) |
//! | [`StageKind::PiezoMirrorSerial`] | serial 115200 8-N-1, PI E-517 | theta (1), phi (2) |
//!
//! Construction discovers and initializes the device and fails fast with
//! `StageError::DeviceNotFound` when nothing usable turns up; no partially
//! opened controller is ever returned. Moves are fire-and-forget: nothing is
//! read back, and the cached [`Position`] only records what was last
//! commanded.
//!
//! The transport is released when the controller is closed or dropped.
//!
//! # Example
//!
//! ```no_run
//! use stage_control::{StageController, StageKind, StageSettings};
//!
//! fn main() -> anyhow::Result<()> {
//!     let settings = StageSettings::load()?;
//!     let mut stage = StageController::open(StageKind::SingleAxisSerial, &settings)?;
//!     stage.move_to(42.0, 3)?;
//!     println!("Z = {}", stage.position().z);
//!     stage.close();
//!     Ok(())
//! }
//! ```

use crate::adapters::{SerialLink, SerialPortProvider};
use crate::commands;
use crate::config::{NanostageSettings, SerialSettings, StageSettings};
use crate::discovery::{self, IdentityMatch};
use crate::error::{StageError, StageResult};
use crate::vendor::{self, ControllerSession, FocusLibrary, FocusSession, MotionLibrary};
use log::{debug, info};
use std::fmt;
use std::str::FromStr;
use std::thread;

/// Axis the focus actuator and the single-axis stage move on.
pub const FOCUS_AXIS: u32 = 3;

/// Nanostage axes brought online and homed during construction.
const NANOSTAGE_AXES: &str = "1 2 3";

/// The device families a controller can drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageKind {
    /// Mad City Labs piezo focus actuator.
    CryoFocus,
    /// PI E-516 single-axis nanopositioner on a serial line.
    SingleAxisSerial,
    /// PI E-712 XYZ nanopositioner over USB.
    XyzNanostage,
    /// PI E-517 two-axis piezo mirror on a serial line.
    PiezoMirrorSerial,
}

impl StageKind {
    /// Every kind, in declaration order.
    pub const ALL: [StageKind; 4] = [
        StageKind::CryoFocus,
        StageKind::SingleAxisSerial,
        StageKind::XyzNanostage,
        StageKind::PiezoMirrorSerial,
    ];

    /// Short name used on the command line and in messages.
    pub fn name(&self) -> &'static str {
        match self {
            StageKind::CryoFocus => "cryo-focus",
            StageKind::SingleAxisSerial => "single-axis",
            StageKind::XyzNanostage => "xyz-nanostage",
            StageKind::PiezoMirrorSerial => "piezo-mirror",
        }
    }

    /// Line speed of the serial kinds.
    pub fn baud_rate(&self) -> Option<u32> {
        match self {
            StageKind::SingleAxisSerial => Some(commands::SINGLE_AXIS_BAUD),
            StageKind::PiezoMirrorSerial => Some(commands::PIEZO_MIRROR_BAUD),
            StageKind::CryoFocus | StageKind::XyzNanostage => None,
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StageKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StageKind::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                let names: Vec<_> = StageKind::ALL.iter().map(StageKind::name).collect();
                format!("unknown stage kind '{}', expected one of: {}", s, names.join(", "))
            })
    }
}

/// Last commanded position in micrometres (mirror axes in the controller's
/// angular units). Never read back from hardware.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Position {
    /// Axis 1 (theta on the mirror).
    pub x: f64,
    /// Axis 2 (phi on the mirror).
    pub y: f64,
    /// Axis 3.
    pub z: f64,
}

/// Owned transport, one variant per device family.
enum Transport {
    CryoFocus(FocusSession),
    SingleAxisSerial(Box<dyn SerialLink>),
    XyzNanostage(ControllerSession),
    PiezoMirrorSerial(Box<dyn SerialLink>),
}

/// A discovered and initialized stage.
pub struct StageController {
    transport: Transport,
    position: Position,
}

impl StageController {
    /// Discover and initialize a stage of `kind` using the backends compiled
    /// into this build.
    ///
    /// # Errors
    /// - `StageError::DeviceNotFound` if discovery exhausts every candidate
    /// - `StageError::FeatureNotEnabled` if the backend for `kind` is not built in
    /// - any error raised while initializing the device found
    pub fn open(kind: StageKind, settings: &StageSettings) -> StageResult<Self> {
        match kind {
            StageKind::CryoFocus => Self::open_cryo_focus(vendor::system_focus_library()?),
            StageKind::XyzNanostage => {
                Self::open_xyz_nanostage(vendor::system_motion_library()?, &settings.nanostage)
            }
            StageKind::SingleAxisSerial => {
                Self::open_single_axis(system_serial()?.as_ref(), &settings.serial)
            }
            StageKind::PiezoMirrorSerial => {
                Self::open_piezo_mirror(system_serial()?.as_ref(), &settings.serial)
            }
        }
    }

    /// Open the focus actuator and park it at half of its calibrated range.
    ///
    /// # Errors
    /// `DeviceNotFound` when the library hands out no handle; library errors
    /// from the calibration read or the initial move (the handle is released).
    pub fn open_cryo_focus(library: Box<dyn FocusLibrary>) -> StageResult<Self> {
        let session = FocusSession::open(library).ok_or_else(|| {
            StageError::not_found(StageKind::CryoFocus, "MCL_InitHandle returned no handle")
        })?;

        let range = session.calibration(FOCUS_AXIS)?;
        let z = range * 0.5;
        session.write(z, FOCUS_AXIS)?;

        info!(
            "Focus actuator ready (handle {}, range {:.3} um, z = {:.3})",
            session.handle(),
            range,
            z
        );
        Ok(Self {
            transport: Transport::CryoFocus(session),
            position: Position {
                z,
                ..Position::default()
            },
        })
    }

    /// Find an E-516 on the serial ports, configure it and home it to
    /// Z = 60.
    ///
    /// The setup commands are sent with a fixed pause after each; nothing
    /// confirms the controller accepted them.
    ///
    /// # Errors
    /// `DeviceNotFound` when no port answered with the E-516 identification.
    pub fn open_single_axis(
        provider: &dyn SerialPortProvider,
        settings: &SerialSettings,
    ) -> StageResult<Self> {
        let kind = StageKind::SingleAxisSerial;
        let link = discovery::find_port(
            provider,
            settings,
            commands::SINGLE_AXIS_BAUD,
            IdentityMatch::Prefix(commands::SINGLE_AXIS_MODEL),
            |link| {
                send_setup(link, &commands::SINGLE_AXIS_SETUP, settings)?;
                link.write_str(commands::SINGLE_AXIS_HOME)
            },
        )?
        .ok_or_else(|| {
            StageError::not_found(
                kind,
                format!("no port answered with {}", commands::SINGLE_AXIS_MODEL),
            )
        })?;

        info!("E-516 ready on {}", link.port_name());
        Ok(Self {
            transport: Transport::SingleAxisSerial(link),
            position: Position {
                z: commands::SINGLE_AXIS_HOME_Z,
                ..Position::default()
            },
        })
    }

    /// Connect to the first E-712 on USB, bring all three axes online with
    /// servo on and move them to 0.
    ///
    /// # Errors
    /// `DeviceNotFound` when no controller is listed or the connection id is
    /// negative; library errors from the initialization calls (the connection
    /// is closed).
    pub fn open_xyz_nanostage(
        library: Box<dyn MotionLibrary>,
        settings: &NanostageSettings,
    ) -> StageResult<Self> {
        let kind = StageKind::XyzNanostage;
        let controllers = library.enumerate_usb(&settings.usb_filter)?;
        let description = controllers.first().ok_or_else(|| {
            StageError::not_found(
                kind,
                format!("no USB controller matches '{}'", settings.usb_filter),
            )
        })?;

        let id = library.connect_usb(description)?;
        if id < 0 {
            return Err(StageError::not_found(
                kind,
                format!("PI_ConnectUSB({}) returned {}", description, id),
            ));
        }
        debug!("Connected to '{}' as id {}", description, id);

        let session = ControllerSession::new(library, id);
        session.online(&[1, 2, 3])?;
        session.servo_on(NANOSTAGE_AXES, 3)?;
        session.move_to(NANOSTAGE_AXES, &[0.0, 0.0, 0.0])?;

        info!("E-712 nanostage ready (id {})", id);
        Ok(Self {
            transport: Transport::XyzNanostage(session),
            position: Position::default(),
        })
    }

    /// Find an E-517 on the serial ports, enable both axes with servo on and
    /// center them at 0.
    ///
    /// # Errors
    /// `DeviceNotFound` when no port's identification contains E-517.
    pub fn open_piezo_mirror(
        provider: &dyn SerialPortProvider,
        settings: &SerialSettings,
    ) -> StageResult<Self> {
        let kind = StageKind::PiezoMirrorSerial;
        let link = discovery::find_port(
            provider,
            settings,
            commands::PIEZO_MIRROR_BAUD,
            IdentityMatch::Contains(commands::PIEZO_MIRROR_MODEL),
            |link| send_setup(link, &commands::PIEZO_MIRROR_SETUP, settings),
        )?
        .ok_or_else(|| {
            StageError::not_found(
                kind,
                format!("no port identified as {}", commands::PIEZO_MIRROR_MODEL),
            )
        })?;

        info!("E-517 mirror ready on {}", link.port_name());
        Ok(Self {
            transport: Transport::PiezoMirrorSerial(link),
            position: Position::default(),
        })
    }

    /// Kind of stage this controller drives.
    pub fn kind(&self) -> StageKind {
        match self.transport {
            Transport::CryoFocus(_) => StageKind::CryoFocus,
            Transport::SingleAxisSerial(_) => StageKind::SingleAxisSerial,
            Transport::XyzNanostage(_) => StageKind::XyzNanostage,
            Transport::PiezoMirrorSerial(_) => StageKind::PiezoMirrorSerial,
        }
    }

    /// Last commanded position.
    pub fn position(&self) -> Position {
        self.position
    }

    /// Serial port in use, for the serial kinds.
    pub fn port_name(&self) -> Option<&str> {
        match &self.transport {
            Transport::SingleAxisSerial(link) | Transport::PiezoMirrorSerial(link) => {
                Some(link.port_name())
            }
            Transport::CryoFocus(_) | Transport::XyzNanostage(_) => None,
        }
    }

    /// Move `axis` (1-based) to `distance`.
    ///
    /// - Focus actuator and single-axis stage: only axis 3 moves; any other
    ///   axis is ignored without touching the device.
    /// - Nanostage: 1 is X, 2 is Y, anything else is Z.
    /// - Mirror: 1 is theta, anything else is phi.
    ///
    /// No limits are checked and nothing is read back; the cached position is
    /// updated to the commanded value.
    ///
    /// # Errors
    /// Transport or library failures are returned as-is. The cache may then
    /// disagree with the device.
    pub fn move_to(&mut self, distance: f64, axis: u32) -> StageResult<()> {
        match &mut self.transport {
            Transport::CryoFocus(session) => {
                if axis != FOCUS_AXIS {
                    return Ok(());
                }
                session.write(distance, axis)?;
                self.position.z = distance;
            }
            Transport::SingleAxisSerial(link) => {
                if axis != FOCUS_AXIS {
                    return Ok(());
                }
                link.write_str(&commands::single_axis_move(distance))?;
                self.position.z = distance;
            }
            Transport::XyzNanostage(session) => {
                let axis_id = match axis {
                    1 => {
                        self.position.x = distance;
                        "1"
                    }
                    2 => {
                        self.position.y = distance;
                        "2"
                    }
                    _ => {
                        self.position.z = distance;
                        "3"
                    }
                };
                session.move_to(axis_id, &[distance])?;
            }
            Transport::PiezoMirrorSerial(link) => {
                link.write_str(commands::piezo_mirror_move_prefix(axis))?;
                if axis == 1 {
                    self.position.x = distance;
                } else {
                    self.position.y = distance;
                }
                link.write_str(&commands::piezo_mirror_move_value(distance))?;
            }
        }
        Ok(())
    }

    /// Release the transport: handles for the focus actuator, the port for
    /// serial stages, the USB connection for the nanostage.
    pub fn close(self) {
        info!("Closing {} stage", self.kind());
        drop(self);
    }
}

impl fmt::Debug for StageController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StageController")
            .field("kind", &self.kind())
            .field("port", &self.port_name())
            .field("position", &self.position)
            .finish()
    }
}

fn send_setup(
    link: &mut dyn SerialLink,
    sequence: &[&str],
    settings: &SerialSettings,
) -> StageResult<()> {
    for command in sequence {
        link.write_str(command)?;
        thread::sleep(settings.command_delay());
    }
    Ok(())
}

#[cfg(feature = "instrument_serial")]
fn system_serial() -> StageResult<Box<dyn SerialPortProvider>> {
    Ok(Box::new(crate::adapters::SystemSerial))
}

#[cfg(not(feature = "instrument_serial"))]
fn system_serial() -> StageResult<Box<dyn SerialPortProvider>> {
    Err(StageError::FeatureNotEnabled("instrument_serial".to_string()))
}
