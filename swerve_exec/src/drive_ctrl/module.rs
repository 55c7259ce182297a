//! Per-wheel swerve module state
//!
//! A module is a leaf state holder: it exposes the current azimuth, speed and
//! cumulative distance of one wheel assembly. The only processing performed
//! here is unit conversion from raw encoder readings.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

// Internal
use super::Params;
use util::maths::norm_pi;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Raw sensor reading for one module, in encoder units.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct ModuleReading {
    /// Azimuth encoder position in motor rotations.
    pub azimuth_rot: f64,

    /// Drive motor velocity in rotations per minute.
    pub drive_rpm: f64,

    /// Cumulative drive encoder position in motor rotations.
    pub drive_rot: f64,
}

/// State of one swerve module.
#[derive(Clone, Copy, Debug, Default, Serialize)]
pub struct SwerveModule {
    /// Index of this module, in [0, 3].
    pub index: usize,

    /// Fixed position of the module's steer axis in the chassis frame.
    ///
    /// Units: meters
    pub position_m: Vector2<f64>,

    /// Current azimuth of the wheel, normalised to (-pi, pi].
    ///
    /// Units: radians
    pub azimuth_rad: f64,

    /// Current wheel speed over the ground.
    ///
    /// Units: meters/second
    pub speed_ms: f64,

    /// Cumulative distance driven by the wheel.
    ///
    /// Units: meters
    pub distance_m: f64,
}

/// Target demanded of one swerve module.
#[derive(Clone, Copy, Debug, Default, Serialize)]
pub struct ModuleTarget {
    /// Index of the module this target is for.
    pub index: usize,

    /// Target azimuth, normalised to (-pi, pi].
    ///
    /// Units: radians
    pub azimuth_rad: f64,

    /// Target wheel speed.
    ///
    /// Units: meters/second
    pub speed_ms: f64,

    /// If true the module drive motor is run open loop.
    pub open_loop: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SwerveModule {
    /// Create a new module at the given chassis-frame position.
    pub fn new(index: usize, position_m: Vector2<f64>) -> Self {
        Self {
            index,
            position_m,
            ..Default::default()
        }
    }

    /// Update the module state from a raw sensor reading.
    ///
    /// Conversions use the gear ratios and wheel circumference from the
    /// parameters, nothing else.
    pub fn update_from_reading(&mut self, reading: &ModuleReading, params: &Params) {
        self.azimuth_rad = norm_pi(
            reading.azimuth_rot * std::f64::consts::TAU / params.azimuth_gear_ratio,
        );
        self.speed_ms =
            reading.drive_rpm * params.wheel_circumference_m / (60.0 * params.drive_gear_ratio);
        self.distance_m = reading.drive_rot * params.wheel_circumference_m / params.drive_gear_ratio;
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_unit_conversion() {
        let params = Params {
            wheel_circumference_m: 0.5,
            drive_gear_ratio: 8.0,
            azimuth_gear_ratio: 12.0,
            ..Default::default()
        };

        let mut module = SwerveModule::new(0, Vector2::new(0.3, 0.3));

        // 3 full steer rotations of the motor is a quarter turn of the wheel,
        // 8 drive rotations is one wheel revolution (0.5 m), 960 rpm is 2
        // wheel revolutions per second (1 m/s).
        module.update_from_reading(
            &ModuleReading {
                azimuth_rot: 3.0,
                drive_rpm: 960.0,
                drive_rot: 8.0,
            },
            &params,
        );

        assert!((module.azimuth_rad - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
        assert!((module.speed_ms - 1.0).abs() < 1e-12);
        assert!((module.distance_m - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_azimuth_normalised() {
        let params = Params {
            wheel_circumference_m: 0.5,
            drive_gear_ratio: 8.0,
            azimuth_gear_ratio: 1.0,
            ..Default::default()
        };

        let mut module = SwerveModule::new(1, Vector2::new(0.3, -0.3));

        // 0.75 of a turn must wrap into (-pi, pi]
        module.update_from_reading(
            &ModuleReading {
                azimuth_rot: 0.75,
                drive_rpm: 0.0,
                drive_rot: 0.0,
            },
            &params,
        );

        assert!((module.azimuth_rad + std::f64::consts::FRAC_PI_2).abs() < 1e-12);
    }
}
