//! Parameters structure for DriveCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use super::NUM_MODULES;
use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for drive control.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct Params {
    // ---- GEOMETRY ----

    /// The position of each module's steer axis in the chassis frame.
    ///
    /// Units: meters,
    /// Frame: Chassis
    pub module_pos_m: [[f64; 2]; NUM_MODULES],

    /// The circumference of the wheels.
    ///
    /// Units: meters
    pub wheel_circumference_m: f64,

    /// Drive gearbox ratio (motor rotations per wheel rotation).
    pub drive_gear_ratio: f64,

    /// Azimuth gearbox ratio (motor rotations per full steer rotation).
    pub azimuth_gear_ratio: f64,

    // ---- CAPABILITIES ----

    /// Maximum achievable module speed.
    ///
    /// Units: meters/second
    pub max_speed_ms: f64,

    /// Maximum commandable angular rate of the chassis.
    ///
    /// Units: radians/second
    pub max_angular_velocity_rads: f64,
}
