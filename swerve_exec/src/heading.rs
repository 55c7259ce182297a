//! # Heading reference module
//!
//! Wraps the inertial sensor's yaw reading with the platform's sign
//! convention and a software zero-offset. The sensor itself is never
//! written to; zeroing is done entirely in the offset so it can be repeated
//! at any time (match start, drift correction between runs).

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};

// Internal
use util::maths::norm_pi;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Raw inertial sensor attitude reading. Only yaw is used by this core.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct YawPitchRoll {
    pub yaw_deg: f64,
    pub pitch_deg: f64,
    pub roll_deg: f64,
}

/// The heading reference.
#[derive(Clone, Copy, Debug, Default)]
pub struct HeadingRef {
    /// If true the sensor yaw increases clockwise and must be inverted to
    /// match the counter-clockwise-positive convention.
    invert: bool,

    /// Offset subtracted from the effective yaw so that the reading at the
    /// last zero maps to 0.
    zero_offset_rad: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl HeadingRef {
    pub fn new(invert: bool) -> Self {
        Self {
            invert,
            zero_offset_rad: 0.0,
        }
    }

    /// Get the heading in radians, normalised to (-pi, pi].
    pub fn yaw_rad(&self, raw: &YawPitchRoll) -> f64 {
        norm_pi(self.effective_yaw_rad(raw) - self.zero_offset_rad)
    }

    /// Zero the heading so the current raw reading maps to 0.
    ///
    /// Idempotent: zeroing twice on the same reading leaves the offset
    /// unchanged.
    pub fn zero(&mut self, raw: &YawPitchRoll) {
        self.zero_offset_rad = self.effective_yaw_rad(raw);
    }

    /// Apply the invert convention to the raw yaw.
    fn effective_yaw_rad(&self, raw: &YawPitchRoll) -> f64 {
        let effective_deg = if self.invert {
            360.0 - raw.yaw_deg
        } else {
            raw.yaw_deg
        };

        effective_deg.to_radians()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const PI: f64 = std::f64::consts::PI;

    fn ypr(yaw_deg: f64) -> YawPitchRoll {
        YawPitchRoll {
            yaw_deg,
            pitch_deg: 0.0,
            roll_deg: 0.0,
        }
    }

    #[test]
    fn test_yaw_normalised() {
        let heading = HeadingRef::new(false);

        assert_eq!(heading.yaw_rad(&ypr(0.0)), 0.0);
        assert!((heading.yaw_rad(&ypr(90.0)) - PI / 2.0).abs() < 1e-12);
        // 270 degrees wraps to -90
        assert!((heading.yaw_rad(&ypr(270.0)) + PI / 2.0).abs() < 1e-12);
        // 180 degrees maps to +pi, never -pi
        assert_eq!(heading.yaw_rad(&ypr(180.0)), PI);
    }

    #[test]
    fn test_invert_convention() {
        let heading = HeadingRef::new(true);

        // A clockwise-positive sensor reading of 90 degrees is a heading of
        // +270 -> -90 under the counter-clockwise convention
        assert!((heading.yaw_rad(&ypr(90.0)) + PI / 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_is_idempotent() {
        let mut heading = HeadingRef::new(false);

        heading.zero(&ypr(123.0));
        assert!(heading.yaw_rad(&ypr(123.0)).abs() < 1e-12);

        heading.zero(&ypr(123.0));
        assert!(heading.yaw_rad(&ypr(123.0)).abs() < 1e-12);

        // Relative readings survive the zero
        assert!((heading.yaw_rad(&ypr(133.0)) - 10f64.to_radians()).abs() < 1e-12);
    }
}
