//! Implementations for the DriveCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{info, trace};
use nalgebra::Vector2;
use serde::Serialize;

// Internal
use super::{
    kinematics, DriveCommand, ModuleReading, ModuleTarget, Params, SwerveModule, NUM_MODULES,
};
use util::{
    archive::{Archived, Archiver},
    module::State,
    params,
    session::Session,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Drive control module state
#[derive(Default)]
pub struct DriveCtrl {
    pub(crate) params: Params,

    /// Per-wheel module state, owned exclusively by the drive controller and
    /// updated once per cycle from sensor readings.
    modules: [SwerveModule; NUM_MODULES],

    pub(crate) report: StatusReport,
    arch_report: Archiver,

    pub(crate) current_cmd: Option<DriveCommand>,

    pub(crate) output: Option<OutputData>,
    arch_output: Archiver,
}

/// Input data to drive control.
#[derive(Clone, Copy, Default)]
pub struct InputData {
    /// The drive command to execute, or `None` if there is no new command on
    /// this cycle.
    pub cmd: Option<DriveCommand>,

    /// Current chassis heading, used for field-relative commands.
    ///
    /// Units: radians
    pub heading_rad: f64,

    /// Raw per-module sensor readings for this cycle.
    pub readings: [ModuleReading; NUM_MODULES],
}

/// Output targets that the motor-control collaborator must execute.
#[derive(Clone, Copy, Debug, Default, Serialize)]
pub struct OutputData {
    /// One target per module, indexed by module number.
    pub targets: [ModuleTarget; NUM_MODULES],
}

/// Status report for DriveCtrl processing.
#[derive(Clone, Copy, Serialize, Debug)]
pub struct StatusReport {
    /// True if the commanded speeds had to be desaturated this cycle.
    pub desaturated: bool,

    /// The factor applied to all module speeds (1.0 if not desaturated).
    pub speed_scale: f64,
}

impl Default for StatusReport {
    fn default() -> Self {
        StatusReport {
            desaturated: false,
            speed_scale: 1.0,
        }
    }
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl State for DriveCtrl {
    type InitData = &'static str;
    type InitError = params::LoadError;

    type InputData = InputData;
    type OutputData = OutputData;
    type StatusReport = StatusReport;
    type ProcError = super::DriveCtrlError;

    /// Initialise the DriveCtrl module.
    ///
    /// Expected init data is the path to the parameter file
    fn init(&mut self, init_data: Self::InitData, session: &Session)
        -> Result<(), Self::InitError>
    {
        // Load the parameters
        self.params = match params::load(init_data) {
            Ok(p) => p,
            Err(e) => return Err(e),
        };

        // Build the module leaves at their configured positions
        for (i, module) in self.modules.iter_mut().enumerate() {
            *module = SwerveModule::new(
                i,
                Vector2::new(self.params.module_pos_m[i][0], self.params.module_pos_m[i][1]),
            );
        }

        // Create the arch folder for drive_ctrl
        let mut arch_path = session.arch_root.clone();
        arch_path.push("drive_ctrl");
        std::fs::create_dir_all(arch_path).unwrap();

        // Initialise the archivers
        self.arch_report = Archiver::from_path(session, "drive_ctrl/status_report.csv").unwrap();
        self.arch_output = Archiver::from_path(session, "drive_ctrl/output.csv").unwrap();

        Ok(())
    }

    /// Perform cyclic processing of drive control.
    fn proc(&mut self, input_data: &Self::InputData)
        -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError>
    {
        // Clear the status report
        self.report = StatusReport::default();

        // Update the module leaves from the raw sensor readings
        for (module, reading) in self.modules.iter_mut().zip(input_data.readings.iter()) {
            module.update_from_reading(reading, &self.params);
        }

        // Check to see if there's a new command
        if let Some(cmd) = input_data.cmd {
            if !cmd.is_valid() {
                return Err(super::DriveCtrlError::InvalidCmd(cmd));
            }

            self.current_cmd = Some(cmd);
        }

        // Azimuths to hold for modules with near-zero demanded speed. Use the
        // last commanded target if there is one, otherwise the wheel's
        // current measured azimuth.
        let last_azimuths_rad = match self.output {
            Some(ref o) => {
                let mut az = [0f64; NUM_MODULES];
                for i in 0..NUM_MODULES {
                    az[i] = o.targets[i].azimuth_rad;
                }
                az
            }
            None => self.module_azimuths_rad(),
        };

        let output = match self.current_cmd {
            Some(cmd) => {
                let (targets, scale) = kinematics::resolve(
                    &cmd.velocity,
                    input_data.heading_rad,
                    cmd.field_relative,
                    cmd.open_loop,
                    &self.params,
                    &last_azimuths_rad,
                );

                self.report.speed_scale = scale;
                self.report.desaturated = scale < 1.0;

                OutputData { targets }
            }
            // No command yet: hold the azimuths with all drive speeds zeroed
            None => {
                let mut targets = [ModuleTarget::default(); NUM_MODULES];
                for (i, target) in targets.iter_mut().enumerate() {
                    target.index = i;
                    target.azimuth_rad = last_azimuths_rad[i];
                }
                OutputData { targets }
            }
        };

        trace!("DriveCtrl output: {:?}", output.targets);

        // Update the output in self
        self.output = Some(output);

        Ok((output, self.report))
    }
}

impl Archived for DriveCtrl {
    fn write(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.arch_report.serialise(self.report)?;
        self.arch_output
            .serialise(OutputRecord::from(&self.output.unwrap_or_default()))?;

        Ok(())
    }
}

impl DriveCtrl {
    /// Replace the drive parameters at runtime.
    ///
    /// This is the explicit reconfiguration point for externally loaded
    /// preferences: the new parameters are validated, then geometry and
    /// capability limits are swapped together and take effect on the next
    /// `proc` call. On error the existing configuration stays in force.
    pub fn reconfigure(&mut self, params: Params) -> Result<(), super::DriveCtrlError> {
        use super::DriveCtrlError::InvalidParams;

        if params.max_speed_ms <= 0.0 {
            return Err(InvalidParams("max_speed_ms must be positive"));
        }
        if params.max_angular_velocity_rads <= 0.0 {
            return Err(InvalidParams("max_angular_velocity_rads must be positive"));
        }
        if params.wheel_circumference_m <= 0.0 {
            return Err(InvalidParams("wheel_circumference_m must be positive"));
        }
        if params.drive_gear_ratio <= 0.0 || params.azimuth_gear_ratio <= 0.0 {
            return Err(InvalidParams("gear ratios must be positive"));
        }

        for (i, module) in self.modules.iter_mut().enumerate() {
            module.position_m = Vector2::new(params.module_pos_m[i][0], params.module_pos_m[i][1]);
        }
        self.params = params;

        info!(
            "DriveCtrl reconfigured: max_speed = {} m/s, max_omega = {} rad/s",
            self.params.max_speed_ms, self.params.max_angular_velocity_rads
        );

        Ok(())
    }

    /// Get the current per-wheel module states.
    pub fn module_states(&self) -> &[SwerveModule; NUM_MODULES] {
        &self.modules
    }

    /// Get the cumulative distance driven by each wheel.
    pub fn module_distances_m(&self) -> [f64; NUM_MODULES] {
        let mut distances = [0f64; NUM_MODULES];
        for (d, module) in distances.iter_mut().zip(self.modules.iter()) {
            *d = module.distance_m;
        }
        distances
    }

    /// Get the current measured azimuth of each wheel.
    pub fn module_azimuths_rad(&self) -> [f64; NUM_MODULES] {
        let mut azimuths = [0f64; NUM_MODULES];
        for (a, module) in azimuths.iter_mut().zip(self.modules.iter()) {
            *a = module.azimuth_rad;
        }
        azimuths
    }
}

// ---------------------------------------------------------------------------
// PRIVATE ITEMS
// ---------------------------------------------------------------------------

/// Flat archive row for the output targets (CSV cannot nest containers).
#[derive(Serialize)]
struct OutputRecord {
    azimuth_rad_0: f64,
    azimuth_rad_1: f64,
    azimuth_rad_2: f64,
    azimuth_rad_3: f64,
    speed_ms_0: f64,
    speed_ms_1: f64,
    speed_ms_2: f64,
    speed_ms_3: f64,
    open_loop: bool,
}

impl From<&OutputData> for OutputRecord {
    fn from(output: &OutputData) -> Self {
        let t = &output.targets;
        OutputRecord {
            azimuth_rad_0: t[0].azimuth_rad,
            azimuth_rad_1: t[1].azimuth_rad,
            azimuth_rad_2: t[2].azimuth_rad,
            azimuth_rad_3: t[3].azimuth_rad,
            speed_ms_0: t[0].speed_ms,
            speed_ms_1: t[1].speed_ms,
            speed_ms_2: t[2].speed_ms,
            speed_ms_3: t[3].speed_ms,
            open_loop: t[0].open_loop,
        }
    }
}
