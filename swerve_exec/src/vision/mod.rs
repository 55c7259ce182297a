//! # Vision pose contributor module
//!
//! Given a landmark detection from the camera collaborator and the static
//! landmark map, produces an optional corrected-pose candidate. The
//! contributor never mutates the odometry pose itself; the caller decides
//! whether and how to merge the candidate.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod landmarks;
mod params;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info};
use nalgebra::Isometry3;

// Internal
pub use landmarks::*;
pub use params::*;

use crate::odometry::Pose;
use util::maths::norm_pi;
use util::params as util_params;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur in the vision contributor.
#[derive(Debug, thiserror::Error)]
pub enum VisionError {
    #[error("Could not load parameters: {0}")]
    ParamLoadError(util_params::LoadError),

    /// A detection referenced a landmark which is not in the map. This is a
    /// configuration error: the map and the detector disagree about the set
    /// of fiducials on the field.
    #[error("Detection references unknown landmark ID {0}")]
    UnknownLandmark(u32),
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A single decoded landmark detection, valid for one cycle only.
#[derive(Debug, Clone)]
pub struct Detection {
    /// Identifier of the detected landmark
    pub landmark_id: u32,

    /// Ambiguity score of the pose solution, in [0, 1]. Higher is less
    /// trustworthy.
    pub ambiguity: f64,

    /// Transform from the camera to the landmark.
    pub camera_to_landmark: Isometry3<f64>,
}

/// The vision pose contributor.
pub struct VisionContributor {
    /// Detections at or above this ambiguity are discarded, never averaged
    /// in.
    ambiguity_threshold: f64,

    /// Transform from the chassis centre to the camera.
    camera_offset: Isometry3<f64>,

    /// The static landmark map.
    landmarks: LandmarkMap,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl VisionContributor {
    /// Initialise the vision contributor.
    ///
    /// Expected init data is the path to the parameter file and the
    /// operating-side origin selection.
    pub fn init(params_path: &str, origin: OriginSide) -> Result<Self, VisionError> {
        let params: Params = match util_params::load(params_path) {
            Ok(p) => p,
            Err(e) => return Err(VisionError::ParamLoadError(e)),
        };

        Ok(Self::from_params(&params, origin))
    }

    /// Build the contributor directly from a parameter struct.
    pub fn from_params(params: &Params, origin: OriginSide) -> Self {
        let mut landmarks = LandmarkMap::from_params(params);
        landmarks.set_origin(origin);

        info!(
            "Vision contributor initialised: {} landmarks, origin {:?}, ambiguity threshold {}",
            landmarks.len(),
            origin,
            params.ambiguity_threshold
        );

        Self {
            ambiguity_threshold: params.ambiguity_threshold,
            camera_offset: params.camera_offset.to_isometry(),
            landmarks,
        }
    }

    /// Produce a corrected-pose candidate from this cycle's detection.
    ///
    /// Returns `Ok(None)` when there is no detection, or when the detection
    /// is too ambiguous to trust. An unknown landmark ID is a configuration
    /// error and is surfaced immediately.
    pub fn correction(&self, detection: Option<&Detection>) -> Result<Option<Pose>, VisionError> {
        let detection = match detection {
            Some(d) => d,
            None => return Ok(None),
        };

        if detection.ambiguity >= self.ambiguity_threshold {
            debug!(
                "Discarding detection of landmark {}: ambiguity {:.3} >= {:.3}",
                detection.landmark_id, detection.ambiguity, self.ambiguity_threshold
            );
            return Ok(None);
        }

        let landmark_pose = match self.landmarks.get(detection.landmark_id) {
            Some(p) => p,
            None => return Err(VisionError::UnknownLandmark(detection.landmark_id)),
        };

        // Project the chassis's field pose by walking back from the landmark
        // through the camera to the chassis centre.
        let chassis_pose =
            landmark_pose * detection.camera_to_landmark.inverse() * self.camera_offset.inverse();

        // Reduce the 3D composite to a planar pose
        let (_, _, yaw_rad) = chassis_pose.rotation.euler_angles();
        Ok(Some(Pose::new(
            chassis_pose.translation.x,
            chassis_pose.translation.y,
            norm_pi(yaw_rad),
        )))
    }

    /// Get the ambiguity threshold in use.
    pub fn ambiguity_threshold(&self) -> f64 {
        self.ambiguity_threshold
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use nalgebra::{Translation3, UnitQuaternion};

    fn test_params() -> Params {
        Params {
            ambiguity_threshold: 0.1,
            camera_offset: TransformSpec {
                x_m: 0.0,
                y_m: 0.0,
                z_m: 0.0,
                roll_rad: 0.0,
                pitch_rad: 0.0,
                yaw_rad: 0.0,
            },
            field_length_m: 16.0,
            field_width_m: 8.0,
            landmarks: vec![LandmarkSpec {
                id: 1,
                pose: TransformSpec {
                    x_m: 2.0,
                    y_m: 0.0,
                    z_m: 0.0,
                    roll_rad: 0.0,
                    pitch_rad: 0.0,
                    yaw_rad: 0.0,
                },
            }],
        }
    }

    fn two_meters_ahead() -> Isometry3<f64> {
        Isometry3::from_parts(
            Translation3::new(2.0, 0.0, 0.0),
            UnitQuaternion::identity(),
        )
    }

    #[test]
    fn test_no_detection_gives_no_correction() {
        let vision = VisionContributor::from_params(&test_params(), OriginSide::Near);
        assert!(vision.correction(None).unwrap().is_none());
    }

    #[test]
    fn test_ambiguous_detection_discarded() {
        let vision = VisionContributor::from_params(&test_params(), OriginSide::Near);

        let detection = Detection {
            landmark_id: 1,
            ambiguity: 0.1,
            camera_to_landmark: two_meters_ahead(),
        };

        // At the threshold is already unreliable
        assert!(vision.correction(Some(&detection)).unwrap().is_none());

        let detection = Detection {
            ambiguity: 0.5,
            ..detection
        };
        assert!(vision.correction(Some(&detection)).unwrap().is_none());
    }

    #[test]
    fn test_good_detection_projects_pose() {
        let vision = VisionContributor::from_params(&test_params(), OriginSide::Near);

        // Landmark at (2, 0, 0) seen 2 m directly ahead with no camera
        // offset puts the chassis at the origin, facing the landmark.
        let detection = Detection {
            landmark_id: 1,
            ambiguity: 0.05,
            camera_to_landmark: two_meters_ahead(),
        };

        let pose = vision.correction(Some(&detection)).unwrap().unwrap();
        assert!(pose.position_m[0].abs() < 1e-9);
        assert!(pose.position_m[1].abs() < 1e-9);
        assert!(pose.heading_rad.abs() < 1e-9);
    }

    #[test]
    fn test_camera_offset_applied() {
        let mut params = test_params();
        // Camera mounted 0.5 m forward of the chassis centre
        params.camera_offset.x_m = 0.5;
        let vision = VisionContributor::from_params(&params, OriginSide::Near);

        let detection = Detection {
            landmark_id: 1,
            ambiguity: 0.05,
            camera_to_landmark: Isometry3::from_parts(
                Translation3::new(1.5, 0.0, 0.0),
                UnitQuaternion::identity(),
            ),
        };

        let pose = vision.correction(Some(&detection)).unwrap().unwrap();
        assert!(pose.position_m[0].abs() < 1e-9);
        assert!(pose.position_m[1].abs() < 1e-9);
    }

    #[test]
    fn test_unknown_landmark_fails_fast() {
        let vision = VisionContributor::from_params(&test_params(), OriginSide::Near);

        let detection = Detection {
            landmark_id: 42,
            ambiguity: 0.05,
            camera_to_landmark: two_meters_ahead(),
        };

        match vision.correction(Some(&detection)) {
            Err(VisionError::UnknownLandmark(42)) => (),
            other => panic!("Expected UnknownLandmark error, got {:?}", other),
        }
    }
}
