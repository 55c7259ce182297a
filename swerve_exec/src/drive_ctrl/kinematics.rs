//! Chassis-to-module kinematics
//!
//! The resolver maps a chassis velocity command onto the four module
//! velocity vectors using the rigid-body twist decomposition: each module's
//! velocity is the chassis translational velocity plus the tangential
//! contribution of the angular rate about the module's position.
//!
//! Desaturation applies one global factor to all four speeds so that the
//! fastest module never exceeds the configured maximum while relative speed
//! ratios (and therefore the commanded chassis motion) are preserved.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
use super::{ChassisVelocity, ModuleTarget, Params, AZIMUTH_HOLD_EPSILON_MS, NUM_MODULES};
use util::maths::{clamp, norm_pi};

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Resolve a chassis velocity command into per-module targets.
///
/// If `field_relative` the command's linear components are rotated from the
/// field frame into the chassis frame using `heading_rad` first. The rotation
/// convention is:
///
/// ```text
/// vx' =  vx*cos(h) + vy*sin(h)
/// vy' = -vx*sin(h) + vy*cos(h)
/// ```
///
/// Modules whose resolved speed is below [`AZIMUTH_HOLD_EPSILON_MS`] keep the
/// azimuth given in `last_azimuths_rad`.
///
/// Returns the targets and the desaturation factor applied to all speeds
/// (1.0 when no desaturation occurred). Pure function, no error conditions.
pub fn resolve(
    cmd: &ChassisVelocity,
    heading_rad: f64,
    field_relative: bool,
    open_loop: bool,
    params: &Params,
    last_azimuths_rad: &[f64; NUM_MODULES],
) -> ([ModuleTarget; NUM_MODULES], f64) {
    // Rotate the linear components into the chassis frame if required
    let (vx_ms, vy_ms) = if field_relative {
        let (sin_h, cos_h) = heading_rad.sin_cos();
        (
            cmd.vx_ms * cos_h + cmd.vy_ms * sin_h,
            -cmd.vx_ms * sin_h + cmd.vy_ms * cos_h,
        )
    } else {
        (cmd.vx_ms, cmd.vy_ms)
    };

    // Limit the angular rate to the chassis capability
    let omega_rads = clamp(
        &cmd.omega_rads,
        &-params.max_angular_velocity_rads,
        &params.max_angular_velocity_rads,
    );

    let mut targets = [ModuleTarget::default(); NUM_MODULES];

    // Twist decomposition: v_i = v + omega x r_i
    for (i, target) in targets.iter_mut().enumerate() {
        let rx_m = params.module_pos_m[i][0];
        let ry_m = params.module_pos_m[i][1];

        let vix_ms = vx_ms - omega_rads * ry_m;
        let viy_ms = vy_ms + omega_rads * rx_m;

        let speed_ms = (vix_ms * vix_ms + viy_ms * viy_ms).sqrt();

        target.index = i;
        target.speed_ms = speed_ms;
        target.open_loop = open_loop;
        target.azimuth_rad = if speed_ms < AZIMUTH_HOLD_EPSILON_MS {
            norm_pi(last_azimuths_rad[i])
        } else {
            viy_ms.atan2(vix_ms)
        };
    }

    let scale = desaturate(&mut targets, params.max_speed_ms);

    (targets, scale)
}

/// Scale all module speeds by a common factor so that none exceeds
/// `max_speed_ms`. Returns the factor applied.
pub fn desaturate(targets: &mut [ModuleTarget; NUM_MODULES], max_speed_ms: f64) -> f64 {
    let max_observed_ms = targets
        .iter()
        .map(|t| t.speed_ms)
        .fold(0f64, f64::max);

    if max_observed_ms > max_speed_ms && max_speed_ms > 0.0 {
        let scale = max_speed_ms / max_observed_ms;
        for target in targets.iter_mut() {
            target.speed_ms *= scale;
        }
        scale
    } else {
        1.0
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const FRAC_PI_2: f64 = std::f64::consts::FRAC_PI_2;
    const FRAC_PI_4: f64 = std::f64::consts::FRAC_PI_4;

    fn test_params() -> Params {
        Params {
            module_pos_m: [[0.3, 0.3], [0.3, -0.3], [-0.3, 0.3], [-0.3, -0.3]],
            wheel_circumference_m: 0.32,
            drive_gear_ratio: 6.75,
            azimuth_gear_ratio: 12.8,
            max_speed_ms: 4.0,
            max_angular_velocity_rads: 10.0,
        }
    }

    #[test]
    fn test_straight_drive_no_desaturation() {
        let cmd = ChassisVelocity {
            vx_ms: 1.0,
            vy_ms: 0.0,
            omega_rads: 0.0,
        };

        let (targets, scale) = resolve(&cmd, 0.0, true, false, &test_params(), &[0.0; 4]);

        assert_eq!(scale, 1.0);
        for target in targets.iter() {
            assert!((target.speed_ms - 1.0).abs() < 1e-12);
            assert!(target.azimuth_rad.abs() < 1e-12);
        }
    }

    #[test]
    fn test_straight_drive_desaturated() {
        let cmd = ChassisVelocity {
            vx_ms: 5.0,
            vy_ms: 0.0,
            omega_rads: 0.0,
        };

        let (targets, scale) = resolve(&cmd, 0.0, true, false, &test_params(), &[0.0; 4]);

        assert!((scale - 0.8).abs() < 1e-12);
        for target in targets.iter() {
            assert!((target.speed_ms - 4.0).abs() < 1e-12);
            assert!(target.azimuth_rad.abs() < 1e-12);
        }
    }

    #[test]
    fn test_desaturation_preserves_ratios() {
        let cmd = ChassisVelocity {
            vx_ms: 4.0,
            vy_ms: 0.0,
            omega_rads: 6.0,
        };
        let params = test_params();

        let (sat, _) = resolve(&cmd, 0.0, false, false, &params, &[0.0; 4]);

        let mut unlimited = params.clone();
        unlimited.max_speed_ms = f64::INFINITY;
        let (raw, _) = resolve(&cmd, 0.0, false, false, &unlimited, &[0.0; 4]);

        // No module over the limit
        for target in sat.iter() {
            assert!(target.speed_ms <= params.max_speed_ms + 1e-12);
        }

        // Pairwise ratios match the un-desaturated solution
        for i in 0..NUM_MODULES {
            for j in 0..NUM_MODULES {
                let ratio_sat = sat[i].speed_ms / sat[j].speed_ms;
                let ratio_raw = raw[i].speed_ms / raw[j].speed_ms;
                assert!((ratio_sat - ratio_raw).abs() < 1e-9);
            }
        }

        // Azimuths are untouched by desaturation
        for i in 0..NUM_MODULES {
            assert!((sat[i].azimuth_rad - raw[i].azimuth_rad).abs() < 1e-12);
        }
    }

    #[test]
    fn test_field_relative_rotation_convention() {
        // Facing +y (heading pi/2), a field +x command must drive the
        // chassis-frame -y direction.
        let cmd = ChassisVelocity {
            vx_ms: 1.0,
            vy_ms: 0.0,
            omega_rads: 0.0,
        };

        let (targets, _) = resolve(&cmd, FRAC_PI_2, true, false, &test_params(), &[0.0; 4]);

        for target in targets.iter() {
            assert!((target.speed_ms - 1.0).abs() < 1e-12);
            assert!((target.azimuth_rad + FRAC_PI_2).abs() < 1e-9);
        }
    }

    #[test]
    fn test_pure_rotation() {
        let cmd = ChassisVelocity {
            vx_ms: 0.0,
            vy_ms: 0.0,
            omega_rads: 1.0,
        };
        let params = test_params();

        let (targets, _) = resolve(&cmd, 0.0, false, false, &params, &[0.0; 4]);

        let radius_m = (0.3f64 * 0.3 + 0.3 * 0.3).sqrt();
        for (i, target) in targets.iter().enumerate() {
            // Tangential speed |omega| * |r|
            assert!((target.speed_ms - radius_m).abs() < 1e-12);

            // Velocity perpendicular to the module position vector
            let dot = target.azimuth_rad.cos() * params.module_pos_m[i][0]
                + target.azimuth_rad.sin() * params.module_pos_m[i][1];
            assert!(dot.abs() < 1e-9);
        }

        // Front-left module moves towards -x +y
        assert!((targets[0].azimuth_rad - 3.0 * FRAC_PI_4).abs() < 1e-9);
    }

    #[test]
    fn test_azimuth_hold_near_zero_speed() {
        let cmd = ChassisVelocity::default();
        let last = [0.1, -0.2, 0.3, -0.4];

        let (targets, _) = resolve(&cmd, 0.0, true, false, &test_params(), &last);

        for (i, target) in targets.iter().enumerate() {
            assert_eq!(target.speed_ms, 0.0);
            assert!((target.azimuth_rad - last[i]).abs() < 1e-12);
        }
    }

    #[test]
    fn test_omega_limited() {
        let cmd = ChassisVelocity {
            vx_ms: 0.0,
            vy_ms: 0.0,
            omega_rads: 100.0,
        };
        let params = test_params();

        let (targets, _) = resolve(&cmd, 0.0, false, false, &params, &[0.0; 4]);

        // Clamped to max_angular_velocity_rads, then desaturated
        let radius_m = (0.3f64 * 0.3 + 0.3 * 0.3).sqrt();
        let expected_ms = (params.max_angular_velocity_rads * radius_m).min(params.max_speed_ms);
        for target in targets.iter() {
            assert!((target.speed_ms - expected_ms).abs() < 1e-9);
        }
    }
}
