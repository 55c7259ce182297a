//! Parameters structure for the vision contributor

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::{Isometry3, Translation3, UnitQuaternion};
use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the vision contributor.
#[derive(Debug, Clone, Deserialize)]
pub struct Params {
    /// Detections with an ambiguity at or above this value are discarded.
    pub ambiguity_threshold: f64,

    /// Transform from the chassis centre to the camera.
    pub camera_offset: TransformSpec,

    /// Length of the field along X.
    ///
    /// Units: meters
    pub field_length_m: f64,

    /// Width of the field along Y.
    ///
    /// Units: meters
    pub field_width_m: f64,

    /// The static landmark map, one entry per fiducial.
    pub landmarks: Vec<LandmarkSpec>,
}

/// A 3D transform given as a translation and intrinsic euler angles.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct TransformSpec {
    pub x_m: f64,
    pub y_m: f64,
    pub z_m: f64,
    pub roll_rad: f64,
    pub pitch_rad: f64,
    pub yaw_rad: f64,
}

/// Field-relative pose of one landmark.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct LandmarkSpec {
    /// Unique fiducial identifier
    pub id: u32,

    /// Pose of the landmark in the field frame.
    pub pose: TransformSpec,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl TransformSpec {
    /// Build the isometry this spec describes.
    pub fn to_isometry(&self) -> Isometry3<f64> {
        Isometry3::from_parts(
            Translation3::new(self.x_m, self.y_m, self.z_m),
            UnitQuaternion::from_euler_angles(self.roll_rad, self.pitch_rad, self.yaw_rad),
        )
    }
}
