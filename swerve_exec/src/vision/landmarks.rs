//! Static landmark map
//!
//! The map is loaded once at startup and is immutable afterwards, with the
//! single exception of the origin-side selection, which mirrors every
//! landmark pose through the field centre to match the platform's operating
//! side.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::{Isometry3, Translation3, UnitQuaternion};
use std::collections::HashMap;

// Internal
use super::Params;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Which side of the field the coordinate origin sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OriginSide {
    /// Origin on the near wall, poses as given in the parameters.
    Near,

    /// Origin on the far wall: every pose is rotated 180 degrees about the
    /// field centre.
    Far,
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Mapping from landmark ID to field-relative 3D pose.
pub struct LandmarkMap {
    /// Poses as specified in the parameters (Near-side origin).
    base: HashMap<u32, Isometry3<f64>>,

    /// Poses under the selected origin side.
    map: HashMap<u32, Isometry3<f64>>,

    field_length_m: f64,
    field_width_m: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl LandmarkMap {
    /// Build the map from the vision parameters, with a Near-side origin.
    pub fn from_params(params: &Params) -> Self {
        let base: HashMap<u32, Isometry3<f64>> = params
            .landmarks
            .iter()
            .map(|spec| (spec.id, spec.pose.to_isometry()))
            .collect();

        Self {
            map: base.clone(),
            base,
            field_length_m: params.field_length_m,
            field_width_m: params.field_width_m,
        }
    }

    /// Select the origin side, mirroring all poses if required.
    ///
    /// Mirroring rotates each pose 180 degrees about the vertical axis
    /// through the field centre: `x' = L - x`, `y' = W - y`,
    /// `yaw' = yaw + pi`.
    pub fn set_origin(&mut self, side: OriginSide) {
        self.map = match side {
            OriginSide::Near => self.base.clone(),
            OriginSide::Far => {
                let flip = Isometry3::from_parts(
                    Translation3::new(self.field_length_m, self.field_width_m, 0.0),
                    UnitQuaternion::from_euler_angles(0.0, 0.0, std::f64::consts::PI),
                );

                self.base
                    .iter()
                    .map(|(id, pose)| (*id, flip * pose))
                    .collect()
            }
        };
    }

    /// Look up the field pose of a landmark.
    pub fn get(&self, id: u32) -> Option<&Isometry3<f64>> {
        self.map.get(&id)
    }

    /// Number of landmarks in the map.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::vision::{LandmarkSpec, TransformSpec};

    const PI: f64 = std::f64::consts::PI;

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
                id: 7,
                pose: TransformSpec {
                    x_m: 2.0,
                    y_m: 1.0,
                    z_m: 0.5,
                    roll_rad: 0.0,
                    pitch_rad: 0.0,
                    yaw_rad: 0.0,
                },
            }],
        }
    }

    #[test]
    fn test_origin_mirroring() {
        let mut map = LandmarkMap::from_params(&test_params());

        map.set_origin(OriginSide::Far);
        let pose = map.get(7).unwrap();
        assert!((pose.translation.x - 14.0).abs() < 1e-12);
        assert!((pose.translation.y - 7.0).abs() < 1e-12);
        assert!((pose.translation.z - 0.5).abs() < 1e-12);
        assert!((pose.rotation.euler_angles().2.abs() - PI).abs() < 1e-9);

        // Selecting Near again restores the original poses
        map.set_origin(OriginSide::Near);
        let pose = map.get(7).unwrap();
        assert!((pose.translation.x - 2.0).abs() < 1e-12);
        assert!((pose.translation.y - 1.0).abs() < 1e-12);
        assert!(pose.rotation.euler_angles().2.abs() < 1e-12);
    }

    #[test]
    fn test_unknown_id() {
        let map = LandmarkMap::from_params(&test_params());
        assert!(map.get(99).is_none());
    }
}
