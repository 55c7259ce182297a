//! Library portion of the swerve platform executable.
//!
//! The modules here form the state-estimation and motion-command core of the
//! platform:
//!
//! - [`drive_ctrl`] - chassis-to-module kinematics and per-wheel targets
//! - [`odometry`] - continuous pose estimation from module deltas
//! - [`heading`] - inertial heading reference with zero-offset handling
//! - [`vision`] - landmark-based pose-correction candidates
//! - [`auto`] - trajectory sequencing for autonomous operation
//! - [`sim`] - synthetic sensor feed for hardware-free execution

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod auto;
pub mod drive_ctrl;
pub mod heading;
pub mod odometry;
pub mod sim;
pub mod vision;
