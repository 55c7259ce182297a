//! # Swerve platform executable
//!
//! Runs the state-estimation and motion-command core against the perfect
//! plant model, executing a short demonstration trajectory run. Sensor
//! readings come from the simulation; everything above the sensor boundary
//! is exactly what would run on the platform.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::eyre::{Result, WrapErr};
use log::{info, warn, LevelFilter};
use std::thread;
use std::time::{Duration, Instant};

// Internal
use swerve_lib::auto::{
    EventMarker, SequencerOutput, Trajectory, TrajectorySample, TrajectorySequencer,
};
use swerve_lib::drive_ctrl::{self, ChassisVelocity, DriveCommand, DriveCtrl};
use swerve_lib::heading::HeadingRef;
use swerve_lib::odometry::{OdometryEstimator, Pose};
use swerve_lib::sim::PerfectSim;
use swerve_lib::vision::{OriginSide, VisionContributor};
use util::{archive::Archived, logger::logger_init, module::State, session::Session};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Target cycle frequency of the main loop.
///
/// Units: hertz
const CYCLE_FREQUENCY_HZ: f64 = 50.0;

/// Safety cap on the number of cycles the demonstration may run for.
const MAX_CYCLES: u64 = 3000;

// ---------------------------------------------------------------------------
// MAIN
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    color_eyre::install()?;

    // ---- INITIALISATION ----

    let session = Session::new("swerve_exec", "sessions")
        .wrap_err("Failed to create the session")?;

    logger_init(LevelFilter::Debug, &session)
        .wrap_err("Failed to initialise the logger")?;

    info!("Swerve platform executable");
    info!("");

    let mut drive_ctrl = DriveCtrl::default();
    drive_ctrl
        .init("drive_ctrl.toml", &session)
        .wrap_err("Failed to initialise drive control")?;
    info!("DriveCtrl init complete");

    let vision = VisionContributor::init("vision.toml", OriginSide::Near)
        .wrap_err("Failed to initialise the vision contributor")?;

    let mut heading_ref = HeadingRef::new(false);

    let mut sim = PerfectSim::new();
    let sim_params = load_drive_params()?;

    // Anchor the odometry at the origin with the current (zeroed) sensors
    heading_ref.zero(&sim.ypr());
    let mut odometry = OdometryEstimator::new(
        heading_ref.yaw_rad(&sim.ypr()),
        [0.0; drive_ctrl::NUM_MODULES],
        Pose::default(),
    );

    let mut sequencer = TrajectorySequencer::new();
    sequencer.add_trajectory("demo_out", demo_out_trajectory());
    sequencer.add_trajectory("demo_turn", demo_turn_trajectory());
    sequencer.register_event(
        "waypoint_reached",
        Box::new(|| info!("Event: waypoint reached")),
    );
    sequencer
        .begin_queue(&["demo_out", "demo_turn"])
        .wrap_err("Failed to start the demonstration run")?;

    // ---- MAIN LOOP ----

    let cycle_period = Duration::from_secs_f64(1.0 / CYCLE_FREQUENCY_HZ);
    let dt_s = 1.0 / CYCLE_FREQUENCY_HZ;
    let mut commanded_omega_rads = 0.0;

    for cycle in 0..MAX_CYCLES {
        let cycle_start = Instant::now();

        // Sense
        let readings = sim.readings(&sim_params);
        let heading_rad = heading_ref.yaw_rad(&sim.ypr());

        // Advance the run and turn its directive into this cycle's command
        let cmd = match sequencer.proc(dt_s) {
            SequencerOutput::None => None,
            SequencerOutput::ResetPose(pose) => {
                info!("Odometry reset to ({:.2}, {:.2}) m", pose.position_m[0], pose.position_m[1]);
                odometry.reset(heading_rad, drive_ctrl.module_distances_m(), pose);
                None
            }
            SequencerOutput::Follow { velocity, .. } => {
                commanded_omega_rads = velocity.omega_rads;
                Some(DriveCommand {
                    velocity,
                    field_relative: true,
                    open_loop: false,
                })
            }
            SequencerOutput::Stop => {
                commanded_omega_rads = 0.0;
                Some(DriveCommand {
                    velocity: ChassisVelocity::default(),
                    field_relative: false,
                    open_loop: false,
                })
            }
        };

        // Drive control
        let (output, report) = drive_ctrl
            .proc(&drive_ctrl::InputData {
                cmd,
                heading_rad,
                readings,
            })
            .wrap_err("Drive control processing failed")?;

        if report.desaturated {
            warn!("Module speeds desaturated by {:.3}", report.speed_scale);
        }

        // Estimate
        let pose = odometry.update(
            heading_rad,
            &drive_ctrl.module_distances_m(),
            &drive_ctrl.module_azimuths_rad(),
            dt_s,
        );

        // No camera in the simulation, but the contributor still runs so a
        // configuration fault surfaces here rather than on the platform
        if let Some(correction) = vision.correction(None)? {
            odometry.reset(heading_rad, drive_ctrl.module_distances_m(), correction);
        }

        if let Err(e) = drive_ctrl.write() {
            warn!("Archive write failed: {}", e);
        }

        if cycle % 50 == 0 {
            info!(
                "Pose: ({:.3}, {:.3}) m, {:.3} rad, {:.3} m/s",
                pose.position_m[0],
                pose.position_m[1],
                pose.heading_rad,
                odometry.speed_ms()
            );
        }

        // Plant
        sim.step(&output.targets, commanded_omega_rads, dt_s);

        if !sequencer.is_active() && cycle > 0 {
            info!(
                "Run complete after {} cycles at pose ({:.3}, {:.3}) m, {:.3} rad",
                cycle,
                pose.position_m[0],
                pose.position_m[1],
                pose.heading_rad
            );
            break;
        }

        // Maintain the cycle period
        let elapsed = cycle_start.elapsed();
        if elapsed < cycle_period {
            thread::sleep(cycle_period - elapsed);
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Load the drive parameters a second time for the plant model, which needs
/// the gear ratios to synthesise raw encoder readings.
fn load_drive_params() -> Result<drive_ctrl::Params> {
    util::params::load("drive_ctrl.toml").wrap_err("Failed to load the plant parameters")
}

/// A 2 m straight-line segment at 1 m/s, with a waypoint event at its
/// midpoint.
fn demo_out_trajectory() -> Trajectory {
    let velocity = ChassisVelocity {
        vx_ms: 1.0,
        vy_ms: 0.0,
        omega_rads: 0.0,
    };

    // Building these in code cannot fail, times are fixed and increasing
    Trajectory::new(
        vec![
            TrajectorySample {
                time_s: 0.0,
                pose: Pose::default(),
                velocity,
            },
            TrajectorySample {
                time_s: 2.0,
                pose: Pose::new(2.0, 0.0, 0.0),
                velocity,
            },
        ],
        vec![EventMarker {
            time_s: 1.0,
            name: "waypoint_reached".into(),
        }],
    )
    .unwrap_or_else(|_| unreachable!())
}

/// A quarter-turn-in-place segment over 2 s.
fn demo_turn_trajectory() -> Trajectory {
    let omega_rads = std::f64::consts::FRAC_PI_2 / 2.0;
    let velocity = ChassisVelocity {
        vx_ms: 0.0,
        vy_ms: 0.0,
        omega_rads,
    };

    Trajectory::new(
        vec![
            TrajectorySample {
                time_s: 0.0,
                pose: Pose::new(2.0, 0.0, 0.0),
                velocity,
            },
            TrajectorySample {
                time_s: 2.0,
                pose: Pose::new(2.0, 0.0, std::f64::consts::FRAC_PI_2),
                velocity,
            },
        ],
        vec![],
    )
    .unwrap_or_else(|_| unreachable!())
}
