//! Trajectory sequencer state machine

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{info, warn};
use std::collections::{HashMap, VecDeque};

// Internal
use super::trajectory::Trajectory;
use super::SequencerError;
use crate::drive_ctrl::ChassisVelocity;
use crate::odometry::Pose;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// The sequencer's operating mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequencerMode {
    /// No run is active.
    Off,

    /// A run has begun but the odometry reset has not yet been issued.
    ResetOdometry,

    /// Actively following a trajectory.
    Following,

    /// The run completed; the stop directive is emitted once more before the
    /// machine returns to `Off`.
    Finished,
}

/// Directive produced by the sequencer each cycle. The caller applies it to
/// the odometry and drive control layers; the sequencer never touches them
/// itself.
#[derive(Debug, Clone, Copy)]
pub enum SequencerOutput {
    /// Nothing to do.
    None,

    /// Re-anchor the odometry estimate at the given pose before following
    /// begins.
    ResetPose(Pose),

    /// Follow the trajectory with the given field-relative velocity demand.
    /// The reference pose is provided for downstream feedback correction.
    Follow {
        velocity: ChassisVelocity,
        pose_ref: Pose,
    },

    /// Bring the platform to a stop.
    Stop,
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// An active trajectory segment.
struct ActiveSegment {
    name: String,
    trajectory: Trajectory,

    /// Elapsed time into this segment.
    ///
    /// Units: seconds
    cursor_s: f64,

    /// Index of the next marker to fire.
    next_marker: usize,
}

/// Sequences one or more named trajectories into a timed run, firing event
/// callbacks at their markers.
pub struct TrajectorySequencer {
    /// Named trajectories available to run.
    library: HashMap<String, Trajectory>,

    /// Registered event callbacks, keyed by marker name.
    events: HashMap<String, Box<dyn FnMut()>>,

    mode: SequencerMode,

    /// The segment currently being followed.
    active: Option<ActiveSegment>,

    /// Segments queued behind the active one.
    queue: VecDeque<ActiveSegment>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl TrajectorySequencer {
    pub fn new() -> Self {
        Self {
            library: HashMap::new(),
            events: HashMap::new(),
            mode: SequencerMode::Off,
            active: None,
            queue: VecDeque::new(),
        }
    }

    /// Add a named trajectory to the library, replacing any previous entry
    /// under the same name.
    pub fn add_trajectory<S: Into<String>>(&mut self, name: S, trajectory: Trajectory) {
        self.library.insert(name.into(), trajectory);
    }

    /// Register an event callback for a marker name.
    pub fn register_event<S: Into<String>>(&mut self, name: S, callback: Box<dyn FnMut()>) {
        self.events.insert(name.into(), callback);
    }

    pub fn mode(&self) -> SequencerMode {
        self.mode
    }

    pub fn is_active(&self) -> bool {
        matches!(
            self.mode,
            SequencerMode::ResetOdometry | SequencerMode::Following
        )
    }

    /// Begin a run over a queue of named trajectories, executed back to back.
    ///
    /// All names are resolved before any state changes, so an unknown name
    /// leaves the sequencer untouched. The odometry reset is issued once, at
    /// the start of the first segment only.
    pub fn begin_queue(&mut self, names: &[&str]) -> Result<(), SequencerError> {
        self.begin(names, true)
    }

    /// Begin a run over a single named trajectory.
    ///
    /// `is_first` selects whether the run starts with an odometry reset.
    /// Pass false when the segment continues from a pose established by an
    /// earlier run.
    pub fn begin_single(&mut self, name: &str, is_first: bool) -> Result<(), SequencerError> {
        self.begin(&[name], is_first)
    }

    /// Abort the active run immediately.
    ///
    /// The sequencer moves to `Finished` so the next `proc` call still emits
    /// the stop directive before the machine returns to `Off`.
    pub fn abort(&mut self) {
        if self.is_active() {
            info!("Trajectory run aborted");
            self.mode = SequencerMode::Finished;
        }
        self.active = None;
        self.queue.clear();
    }

    /// Advance the run by `dt_s` and produce this cycle's directive.
    pub fn proc(&mut self, dt_s: f64) -> SequencerOutput {
        match self.mode {
            SequencerMode::Off => SequencerOutput::None,
            SequencerMode::ResetOdometry => {
                self.mode = SequencerMode::Following;

                // Reset happens before any motion, so time does not advance
                // this cycle.
                match &self.active {
                    Some(segment) => {
                        SequencerOutput::ResetPose(segment.trajectory.initial_pose())
                    }
                    None => {
                        // No active segment can only mean a logic error in
                        // begin; fail safe by stopping.
                        warn!("Reset requested with no active segment");
                        self.mode = SequencerMode::Finished;
                        SequencerOutput::Stop
                    }
                }
            }
            SequencerMode::Following => self.proc_following(dt_s.max(0.0)),
            SequencerMode::Finished => {
                self.mode = SequencerMode::Off;
                SequencerOutput::Stop
            }
        }
    }

    fn begin(&mut self, names: &[&str], reset_first: bool) -> Result<(), SequencerError> {
        if self.is_active() {
            return Err(SequencerError::RunAlreadyActive);
        }
        if names.is_empty() {
            return Err(SequencerError::EmptyQueue);
        }

        // Resolve every name before touching any state
        let mut segments = VecDeque::with_capacity(names.len());
        for name in names {
            let trajectory = self
                .library
                .get(*name)
                .ok_or_else(|| SequencerError::UnknownTrajectory((*name).to_string()))?;

            segments.push_back(ActiveSegment {
                name: (*name).to_string(),
                trajectory: trajectory.clone(),
                cursor_s: 0.0,
                next_marker: 0,
            });
        }

        self.active = segments.pop_front();
        self.queue = segments;
        self.mode = if reset_first {
            SequencerMode::ResetOdometry
        } else {
            SequencerMode::Following
        };

        info!(
            "Trajectory run started: {} segment(s), reset {}",
            names.len(),
            if reset_first { "on" } else { "off" }
        );

        Ok(())
    }

    fn proc_following(&mut self, dt_s: f64) -> SequencerOutput {
        let mut remaining_s = dt_s;

        loop {
            let segment = match &mut self.active {
                Some(s) => s,
                None => {
                    self.mode = SequencerMode::Finished;
                    return SequencerOutput::Stop;
                }
            };

            segment.cursor_s += remaining_s;
            remaining_s = 0.0;

            let duration_s = segment.trajectory.duration_s();
            let fire_until_s = segment.cursor_s.min(duration_s);

            // Fire every marker the cursor has passed, each exactly once, in
            // time order
            while segment.next_marker < segment.trajectory.markers.len()
                && segment.trajectory.markers[segment.next_marker].time_s <= fire_until_s
            {
                let name = segment.trajectory.markers[segment.next_marker].name.clone();
                segment.next_marker += 1;

                match self.events.get_mut(&name) {
                    Some(callback) => {
                        info!("Firing event '{}'", name);
                        callback();
                    }
                    None => warn!("No event registered for marker '{}'", name),
                }
            }

            if segment.cursor_s < duration_s {
                let sample = segment.trajectory.sample(segment.cursor_s);
                return SequencerOutput::Follow {
                    velocity: sample.velocity,
                    pose_ref: sample.pose,
                };
            }

            // Segment complete, chain into the next one carrying the time
            // overshoot so the run's total duration is exact
            info!("Trajectory segment '{}' complete", segment.name);
            remaining_s = segment.cursor_s - duration_s;
            self.active = self.queue.pop_front();
        }
    }
}

impl Default for TrajectorySequencer {
    fn default() -> Self {
        Self::new()
    }
}
