//! # Autonomous trajectory execution module
//!
//! Sequences named, time-parameterised trajectories into a timed run. The
//! sequencer outputs directives (odometry reset, velocity demand, stop)
//! rather than driving the lower layers directly, so the main loop stays the
//! single owner of the drive control and odometry state.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod sequencer;
mod trajectory;

// ---------------------------------------------------------------------------
// EXPORTS
// ---------------------------------------------------------------------------

pub use sequencer::*;
pub use trajectory::*;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors raised by the trajectory sequencer.
#[derive(Debug, thiserror::Error)]
pub enum SequencerError {
    /// A run referenced a trajectory name that has not been added to the
    /// library.
    #[error("No trajectory named \"{0}\" in the library")]
    UnknownTrajectory(String),

    /// A new run was requested while one was still active. The active run
    /// must be aborted first.
    #[error("A trajectory run is already active")]
    RunAlreadyActive,

    /// A run was requested with no trajectories in it.
    #[error("Cannot begin a run with an empty trajectory queue")]
    EmptyQueue,
}
