//! # Odometry module
//!
//! Maintains the platform's running 2D pose estimate by integrating
//! per-module distance deltas. The inertial heading is authoritative for
//! orientation; the wheels contribute position only, which keeps wheel slip
//! out of the heading estimate.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::trace;
use nalgebra::{Rotation2, Vector2};
use serde::{Deserialize, Serialize};

// Internal
use crate::drive_ctrl::NUM_MODULES;
use util::maths::norm_pi;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The current pose (position and heading in the field frame) of the
/// platform.
#[derive(Debug, Copy, Clone, Default, Serialize, Deserialize)]
pub struct Pose {
    /// The position in the field frame
    ///
    /// Units: meters
    pub position_m: Vector2<f64>,

    /// The heading (angle to the positive field X axis), normalised to
    /// (-pi, pi].
    ///
    /// Units: radians
    pub heading_rad: f64,
}

/// Integrates module odometry and the heading reference into a continuous
/// pose estimate.
pub struct OdometryEstimator {
    pose: Pose,

    /// Offset added to the raw heading so that the estimate matches the pose
    /// set by the last reset.
    heading_offset_rad: f64,

    /// Cumulative module distances at the previous update, the integration
    /// baseline.
    last_distances_m: [f64; NUM_MODULES],

    /// Finite-difference chassis speed estimate.
    speed_ms: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Pose {
    pub fn new(x_m: f64, y_m: f64, heading_rad: f64) -> Self {
        Self {
            position_m: Vector2::new(x_m, y_m),
            heading_rad: norm_pi(heading_rad),
        }
    }
}

impl OdometryEstimator {
    /// Create a new estimator anchored at the given pose, with the given raw
    /// heading and module distances as integration baselines.
    pub fn new(
        raw_heading_rad: f64,
        distances_m: [f64; NUM_MODULES],
        initial_pose: Pose,
    ) -> Self {
        let mut estimator = Self {
            pose: Pose::default(),
            heading_offset_rad: 0.0,
            last_distances_m: [0.0; NUM_MODULES],
            speed_ms: 0.0,
        };
        estimator.reset(raw_heading_rad, distances_m, initial_pose);
        estimator
    }

    /// Integrate one cycle of module odometry into the pose estimate.
    ///
    /// Each module's distance delta acts along its azimuth; the mean of the
    /// four displacement vectors is the chassis-frame displacement, which is
    /// rotated into the field frame by the heading and accumulated.
    ///
    /// A non-positive `dt_s` (non-monotonic clock) retains the previous speed
    /// estimate rather than dividing by zero.
    pub fn update(
        &mut self,
        raw_heading_rad: f64,
        distances_m: &[f64; NUM_MODULES],
        azimuths_rad: &[f64; NUM_MODULES],
        dt_s: f64,
    ) -> Pose {
        let heading_rad = norm_pi(raw_heading_rad + self.heading_offset_rad);

        // Mean of the per-module displacement vectors, in the chassis frame
        let mut delta_m = Vector2::new(0f64, 0f64);
        for i in 0..NUM_MODULES {
            let dist_m = distances_m[i] - self.last_distances_m[i];
            delta_m += Vector2::new(
                dist_m * azimuths_rad[i].cos(),
                dist_m * azimuths_rad[i].sin(),
            );
        }
        delta_m /= NUM_MODULES as f64;

        let previous_position_m = self.pose.position_m;

        // Rotate into the field frame and accumulate
        self.pose.position_m += Rotation2::new(heading_rad) * delta_m;
        self.pose.heading_rad = heading_rad;

        // Finite-difference speed estimate over wall-clock time
        if dt_s > 0.0 {
            self.speed_ms = (self.pose.position_m - previous_position_m).norm() / dt_s;
        }

        self.last_distances_m = *distances_m;

        trace!(
            "Odometry pose: ({:.3}, {:.3}) m, {:.3} rad, {:.3} m/s",
            self.pose.position_m[0],
            self.pose.position_m[1],
            self.pose.heading_rad,
            self.speed_ms
        );

        self.pose
    }

    /// Replace the running pose and resynchronise the integration baselines.
    ///
    /// Used once at the start of an autonomous run, and manually to re-anchor
    /// against an external fix.
    pub fn reset(
        &mut self,
        raw_heading_rad: f64,
        distances_m: [f64; NUM_MODULES],
        pose: Pose,
    ) {
        self.pose = Pose {
            position_m: pose.position_m,
            heading_rad: norm_pi(pose.heading_rad),
        };
        self.heading_offset_rad = norm_pi(pose.heading_rad - raw_heading_rad);
        self.last_distances_m = distances_m;
        self.speed_ms = 0.0;
    }

    /// Get the current pose estimate.
    pub fn pose(&self) -> Pose {
        self.pose
    }

    /// Get the finite-difference chassis speed estimate.
    ///
    /// Units: meters/second
    pub fn speed_ms(&self) -> f64 {
        self.speed_ms
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const PI: f64 = std::f64::consts::PI;
    const FRAC_PI_2: f64 = std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_no_motion_is_idempotent() {
        let distances = [1.0, 2.0, 3.0, 4.0];
        let mut odom = OdometryEstimator::new(0.0, distances, Pose::new(1.0, 2.0, 0.5));

        let pose = odom.update(0.0, &distances, &[0.0; 4], 0.02);

        assert!((pose.position_m[0] - 1.0).abs() < 1e-12);
        assert!((pose.position_m[1] - 2.0).abs() < 1e-12);
        assert!((pose.heading_rad - 0.5).abs() < 1e-12);
        assert_eq!(odom.speed_ms(), 0.0);
    }

    #[test]
    fn test_straight_drive() {
        let mut odom = OdometryEstimator::new(0.0, [0.0; 4], Pose::default());

        // All wheels forward 1 m at azimuth 0, heading 0
        let pose = odom.update(0.0, &[1.0; 4], &[0.0; 4], 1.0);

        assert!((pose.position_m[0] - 1.0).abs() < 1e-12);
        assert!(pose.position_m[1].abs() < 1e-12);
        assert!((odom.speed_ms() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_heading_rotates_displacement_into_field() {
        let mut odom = OdometryEstimator::new(FRAC_PI_2, [0.0; 4], Pose::new(0.0, 0.0, FRAC_PI_2));

        // Chassis-forward motion while facing +y moves the platform along +y
        let pose = odom.update(FRAC_PI_2, &[1.0; 4], &[0.0; 4], 1.0);

        assert!(pose.position_m[0].abs() < 1e-12);
        assert!((pose.position_m[1] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_heading_is_authoritative() {
        let mut odom = OdometryEstimator::new(0.0, [0.0; 4], Pose::default());

        // No wheel motion, but the inertial heading moves
        let pose = odom.update(1.0, &[0.0; 4], &[0.0; 4], 0.02);

        assert!((pose.heading_rad - 1.0).abs() < 1e-12);
        assert!(pose.position_m.norm() < 1e-12);
    }

    #[test]
    fn test_heading_normalised_near_wrap() {
        let mut odom = OdometryEstimator::new(0.0, [0.0; 4], Pose::default());

        let pose = odom.update(PI + 0.1, &[0.0; 4], &[0.0; 4], 0.02);

        assert!(pose.heading_rad > -PI);
        assert!(pose.heading_rad <= PI);
        assert!((pose.heading_rad - (0.1 - PI)).abs() < 1e-9);
    }

    #[test]
    fn test_non_monotonic_clock_retains_speed() {
        let mut odom = OdometryEstimator::new(0.0, [0.0; 4], Pose::default());

        odom.update(0.0, &[1.0; 4], &[0.0; 4], 1.0);
        assert!((odom.speed_ms() - 1.0).abs() < 1e-12);

        // Zero and negative dt must not change the estimate
        odom.update(0.0, &[2.0; 4], &[0.0; 4], 0.0);
        assert!((odom.speed_ms() - 1.0).abs() < 1e-12);
        odom.update(0.0, &[3.0; 4], &[0.0; 4], -0.5);
        assert!((odom.speed_ms() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_reset_reanchors_baselines() {
        let mut odom = OdometryEstimator::new(0.0, [0.0; 4], Pose::default());
        odom.update(0.0, &[5.0; 4], &[0.0; 4], 1.0);

        // Re-anchor at a new pose with the current distances as baseline
        odom.reset(0.3, [5.0; 4], Pose::new(2.0, 3.0, 1.0));

        // The accumulated distances must not be re-integrated
        let pose = odom.update(0.3, &[5.0; 4], &[0.0; 4], 0.02);
        assert!((pose.position_m[0] - 2.0).abs() < 1e-12);
        assert!((pose.position_m[1] - 3.0).abs() < 1e-12);
        assert!((pose.heading_rad - 1.0).abs() < 1e-12);
        assert_eq!(odom.speed_ms(), 0.0);
    }
}
