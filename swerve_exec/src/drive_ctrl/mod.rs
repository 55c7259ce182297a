//! Drive control module
//!
//! Converts a chassis velocity command into per-module azimuth and speed
//! targets, and owns the per-wheel module state.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod cmd;
mod kinematics;
mod module;
mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use cmd::*;
pub use kinematics::*;
pub use module::*;
pub use params::*;
pub use state::*;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// The number of swerve modules on the platform.
pub const NUM_MODULES: usize = 4;

/// Module speed below which the azimuth holds its last commanded value.
///
/// Below this threshold the direction of the module velocity vector is
/// numerically meaningless and re-aiming the wheel would cause chatter.
///
/// Units: meters/second
pub const AZIMUTH_HOLD_EPSILON_MS: f64 = 1e-3;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during DriveCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum DriveCtrlError {
    #[error("Recieved an invalid drive command: {0:#?}")]
    InvalidCmd(DriveCommand),

    #[error("Invalid drive parameters: {0}")]
    InvalidParams(&'static str),
}
