//! Commands passed into DriveCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Desired planar velocity of the chassis.
///
/// The linear components are expressed either in the chassis frame or the
/// field frame, selected by [`DriveCommand::field_relative`].
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct ChassisVelocity {
    /// Linear velocity along the X axis.
    ///
    /// Units: meters/second
    pub vx_ms: f64,

    /// Linear velocity along the Y axis.
    ///
    /// Units: meters/second
    pub vy_ms: f64,

    /// Angular rate about the vertical axis, positive counter-clockwise.
    ///
    /// Units: radians/second
    pub omega_rads: f64,
}

/// A per-tick command to the drive controller.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct DriveCommand {
    /// The desired chassis velocity.
    pub velocity: ChassisVelocity,

    /// If true `velocity` is expressed in the field frame and must be rotated
    /// into the chassis frame using the current heading.
    pub field_relative: bool,

    /// If true the modules are driven open loop (no wheel speed feedback).
    pub open_loop: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl DriveCommand {
    /// Determine if the command is valid (i.e. contains no non-finite data).
    pub fn is_valid(&self) -> bool {
        self.velocity.vx_ms.is_finite()
            && self.velocity.vy_ms.is_finite()
            && self.velocity.omega_rads.is_finite()
    }
}
