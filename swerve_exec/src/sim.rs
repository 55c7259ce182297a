//! # Simulation module
//!
//! A perfect-response plant model used to run the executable without
//! hardware. Module targets are achieved instantly and the inertial sensor
//! tracks the commanded angular rate exactly, so the sensor readings this
//! module produces exercise the same unit conversions the real sensors
//! would.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
use crate::drive_ctrl::{ModuleReading, ModuleTarget, Params, NUM_MODULES};
use crate::heading::YawPitchRoll;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Perfect-response simulation of the drive hardware.
#[derive(Default)]
pub struct PerfectSim {
    /// Current azimuth of each wheel.
    ///
    /// Units: radians
    azimuths_rad: [f64; NUM_MODULES],

    /// Current speed of each wheel.
    ///
    /// Units: meters/second
    speeds_ms: [f64; NUM_MODULES],

    /// Cumulative distance driven by each wheel.
    ///
    /// Units: meters
    distances_m: [f64; NUM_MODULES],

    /// Accumulated (unwrapped) yaw of the chassis, as the inertial sensor
    /// would report it.
    ///
    /// Units: degrees
    yaw_deg: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PerfectSim {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the plant by `dt_s` under the given module targets and chassis
    /// angular rate.
    pub fn step(
        &mut self,
        targets: &[ModuleTarget; NUM_MODULES],
        omega_rads: f64,
        dt_s: f64,
    ) {
        for (i, target) in targets.iter().enumerate() {
            self.azimuths_rad[i] = target.azimuth_rad;
            self.speeds_ms[i] = target.speed_ms;
            self.distances_m[i] += target.speed_ms * dt_s;
        }

        self.yaw_deg += omega_rads.to_degrees() * dt_s;
    }

    /// Produce the raw encoder readings the sensors would report, using the
    /// inverse of the drive parameter unit conversions.
    pub fn readings(&self, params: &Params) -> [ModuleReading; NUM_MODULES] {
        let mut readings = [ModuleReading::default(); NUM_MODULES];

        for (i, reading) in readings.iter_mut().enumerate() {
            reading.azimuth_rot =
                self.azimuths_rad[i] * params.azimuth_gear_ratio / std::f64::consts::TAU;
            reading.drive_rpm =
                self.speeds_ms[i] * 60.0 * params.drive_gear_ratio / params.wheel_circumference_m;
            reading.drive_rot =
                self.distances_m[i] * params.drive_gear_ratio / params.wheel_circumference_m;
        }

        readings
    }

    /// Produce the inertial sensor attitude reading.
    pub fn ypr(&self) -> YawPitchRoll {
        YawPitchRoll {
            yaw_deg: self.yaw_deg,
            pitch_deg: 0.0,
            roll_deg: 0.0,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::drive_ctrl::SwerveModule;
    use nalgebra::Vector2;

    fn test_params() -> Params {
        Params {
            wheel_circumference_m: 0.5,
            drive_gear_ratio: 8.0,
            azimuth_gear_ratio: 12.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_readings_round_trip_through_module_conversion() {
        let params = test_params();
        let mut sim = PerfectSim::new();

        let mut targets = [ModuleTarget::default(); NUM_MODULES];
        for (i, target) in targets.iter_mut().enumerate() {
            target.index = i;
            target.azimuth_rad = 0.5;
            target.speed_ms = 1.5;
        }

        sim.step(&targets, 0.0, 2.0);
        let readings = sim.readings(&params);

        // Converting the simulated raw readings back through the module gives
        // the simulated truth
        let mut module = SwerveModule::new(0, Vector2::new(0.3, 0.3));
        module.update_from_reading(&readings[0], &params);

        assert!((module.azimuth_rad - 0.5).abs() < 1e-12);
        assert!((module.speed_ms - 1.5).abs() < 1e-12);
        assert!((module.distance_m - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_yaw_integrates_omega() {
        let mut sim = PerfectSim::new();
        let targets = [ModuleTarget::default(); NUM_MODULES];

        // Half a rad/s for two seconds
        sim.step(&targets, 0.5, 1.0);
        sim.step(&targets, 0.5, 1.0);

        assert!((sim.ypr().yaw_deg - 1f64.to_degrees()).abs() < 1e-9);
    }
}
