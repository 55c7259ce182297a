//! Time-parameterised trajectory data

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};

// Internal
use crate::drive_ctrl::ChassisVelocity;
use crate::odometry::Pose;
use util::maths::{ang_dist_pi, lin_map, norm_pi};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A single point on a trajectory's timeline.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TrajectorySample {
    /// Time of this sample from the start of the trajectory.
    ///
    /// Units: seconds
    pub time_s: f64,

    /// Field-frame pose the platform should occupy at this time.
    pub pose: Pose,

    /// Field-relative chassis velocity demanded at this time.
    pub velocity: ChassisVelocity,
}

/// A named marker on the trajectory timeline, used to trigger a registered
/// event callback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMarker {
    /// Time of the marker from the start of the trajectory.
    ///
    /// Units: seconds
    pub time_s: f64,

    /// Name of the event to fire.
    pub name: String,
}

/// A complete time-parameterised trajectory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trajectory {
    /// Samples in strictly increasing time order.
    pub samples: Vec<TrajectorySample>,

    /// Event markers in non-decreasing time order.
    pub markers: Vec<EventMarker>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors that make a trajectory unusable.
#[derive(Debug, thiserror::Error)]
pub enum TrajectoryError {
    #[error("Trajectory has no samples")]
    Empty,

    #[error("Trajectory sample times are not strictly increasing at index {0}")]
    NonMonotonicSamples(usize),

    #[error("Trajectory marker times are not non-decreasing at index {0}")]
    NonMonotonicMarkers(usize),

    /// A marker past the end of the timeline would never fire, a marker
    /// before its start is equally a configuration error.
    #[error("Trajectory marker {0} lies outside the sampled time range")]
    MarkerOutOfRange(usize),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Trajectory {
    /// Build a trajectory from samples and markers, validating ordering.
    pub fn new(
        samples: Vec<TrajectorySample>,
        markers: Vec<EventMarker>,
    ) -> Result<Self, TrajectoryError> {
        if samples.is_empty() {
            return Err(TrajectoryError::Empty);
        }

        for i in 1..samples.len() {
            if samples[i].time_s <= samples[i - 1].time_s {
                return Err(TrajectoryError::NonMonotonicSamples(i));
            }
        }

        for i in 1..markers.len() {
            if markers[i].time_s < markers[i - 1].time_s {
                return Err(TrajectoryError::NonMonotonicMarkers(i));
            }
        }

        let start_s = samples[0].time_s;
        let end_s = samples[samples.len() - 1].time_s;
        for (i, marker) in markers.iter().enumerate() {
            if marker.time_s < start_s || marker.time_s > end_s {
                return Err(TrajectoryError::MarkerOutOfRange(i));
            }
        }

        Ok(Self { samples, markers })
    }

    /// The pose at the start of the trajectory.
    pub fn initial_pose(&self) -> Pose {
        self.samples[0].pose
    }

    /// Total duration of the trajectory.
    ///
    /// Units: seconds
    pub fn duration_s(&self) -> f64 {
        self.samples[self.samples.len() - 1].time_s
    }

    /// Sample the trajectory at the given time.
    ///
    /// Poses and velocities are linearly interpolated between neighbouring
    /// samples, with heading interpolated along the shortest angular path.
    /// Times before the start clamp to the first sample, times past the end
    /// to the last.
    pub fn sample(&self, time_s: f64) -> TrajectorySample {
        let first = &self.samples[0];
        if time_s <= first.time_s {
            return *first;
        }

        let last = &self.samples[self.samples.len() - 1];
        if time_s >= last.time_s {
            return *last;
        }

        // Index of the first sample at or after time_s. The clamps above
        // guarantee 1 <= idx < len.
        let idx = self
            .samples
            .iter()
            .position(|s| s.time_s >= time_s)
            .unwrap_or(self.samples.len() - 1);

        let a = &self.samples[idx - 1];
        let b = &self.samples[idx];

        let pose = Pose::new(
            lin_map(
                (a.time_s, b.time_s),
                (a.pose.position_m[0], b.pose.position_m[0]),
                time_s,
            ),
            lin_map(
                (a.time_s, b.time_s),
                (a.pose.position_m[1], b.pose.position_m[1]),
                time_s,
            ),
            norm_pi(
                a.pose.heading_rad
                    + ang_dist_pi(a.pose.heading_rad, b.pose.heading_rad)
                        * ((time_s - a.time_s) / (b.time_s - a.time_s)),
            ),
        );

        let velocity = ChassisVelocity {
            vx_ms: lin_map((a.time_s, b.time_s), (a.velocity.vx_ms, b.velocity.vx_ms), time_s),
            vy_ms: lin_map((a.time_s, b.time_s), (a.velocity.vy_ms, b.velocity.vy_ms), time_s),
            omega_rads: lin_map(
                (a.time_s, b.time_s),
                (a.velocity.omega_rads, b.velocity.omega_rads),
                time_s,
            ),
        };

        TrajectorySample {
            time_s,
            pose,
            velocity,
        }
    }
}
