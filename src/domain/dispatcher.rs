//! Command Dispatcher
//!
//! Turns operator input into [`RemoteCommand`]s. Discrete inputs map 1:1 onto
//! a command. Joystick samples arrive at frame rate, so each axis is
//! edge-triggered: a start command is produced when the axis leaves the
//! neutral band and a stop when it re-enters it, nothing in between.

use crate::domain::command::RemoteCommand;
use crate::domain::models::{ControlSurface, JoystickVector};
use crate::domain::settings::ControlSettings;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// One operator gesture, as produced by the control surfaces.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlInput {
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    StopMoving,
    LightOn,
    LightOff,
    AlarmOn,
    AlarmOff,
    SpeedIncrease,
    SpeedDecrease,
    /// `None` is ignored
    SelectMode(Option<String>),
    Reset,
    Joystick {
        surface: ControlSurface,
        vector: JoystickVector,
    },
}

/// What to do when an axis jumps from one active side to the other without
/// a sample inside the neutral band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReversalPolicy {
    /// Keep the current motion; the new direction is ignored until the
    /// stick passes through neutral.
    #[default]
    ContinueMotion,
    /// Emit a stop followed by the start command for the new direction.
    /// Each reversal then counts as one extra stop/start pair.
    StopThenRestart,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum AxisState {
    #[default]
    Neutral,
    Active(Direction),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Negative,
    Positive,
}

enum Zone {
    Neutral,
    Active(Direction),
    /// Exactly on the threshold: neither inside the band nor past it.
    Edge,
}

fn classify(value: f64, threshold: f64) -> Zone {
    if value.abs() < threshold {
        Zone::Neutral
    } else if value > threshold {
        Zone::Active(Direction::Positive)
    } else if value < -threshold {
        Zone::Active(Direction::Negative)
    } else {
        Zone::Edge
    }
}

/// Per-axis edge detection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MotionAxisState {
    moving: AxisState,
    steering: AxisState,
}

impl MotionAxisState {
    pub fn is_moving(&self) -> bool {
        self.moving != AxisState::Neutral
    }

    pub fn is_steering(&self) -> bool {
        self.steering != AxisState::Neutral
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

struct AxisCommands {
    negative: RemoteCommand,
    positive: RemoteCommand,
}

pub struct CommandDispatcher {
    axes: MotionAxisState,
    controls: ControlSettings,
}

impl CommandDispatcher {
    pub fn new(controls: ControlSettings) -> Self {
        Self {
            axes: MotionAxisState::default(),
            controls,
        }
    }

    pub fn axes(&self) -> MotionAxisState {
        self.axes
    }

    pub fn controls(&self) -> &ControlSettings {
        &self.controls
    }

    pub fn set_controls(&mut self, controls: ControlSettings) {
        self.controls = controls;
    }

    /// Forget any in-progress gesture so the next sample starts from neutral.
    pub fn clear_axes(&mut self) {
        self.axes.clear();
    }

    /// Translate one input into the commands it produces (possibly none).
    pub fn dispatch(&mut self, input: ControlInput) -> Vec<RemoteCommand> {
        let command = match input {
            ControlInput::MoveUp => RemoteCommand::Forward,
            ControlInput::MoveDown => RemoteCommand::Backward,
            ControlInput::MoveLeft => RemoteCommand::Left,
            ControlInput::MoveRight => RemoteCommand::Right,
            ControlInput::StopMoving => RemoteCommand::Stop,
            ControlInput::LightOn => RemoteCommand::LightOn,
            ControlInput::LightOff => RemoteCommand::LightOff,
            ControlInput::AlarmOn => RemoteCommand::AlarmOn,
            ControlInput::AlarmOff => RemoteCommand::AlarmOff,
            ControlInput::SpeedIncrease => RemoteCommand::IncreaseSpeed,
            ControlInput::SpeedDecrease => RemoteCommand::DecreaseSpeed,
            ControlInput::SelectMode(Some(mode)) => RemoteCommand::SelectMode(mode),
            ControlInput::SelectMode(None) => return Vec::new(),
            ControlInput::Reset => self.reset(),
            ControlInput::Joystick { surface, vector } => {
                return self.joystick_move(surface, vector)
            }
        };
        vec![command]
    }

    /// Unconditional reset; also clears both axes.
    pub fn reset(&mut self) -> RemoteCommand {
        self.axes.clear();
        RemoteCommand::Reset
    }

    /// Edge-triggered translation of one joystick sample. The Y axis is
    /// evaluated before the X axis.
    pub fn joystick_move(
        &mut self,
        surface: ControlSurface,
        vector: JoystickVector,
    ) -> Vec<RemoteCommand> {
        let threshold = self.controls.threshold_for(surface);
        let policy = self.controls.reversal_policy;
        let mut out = Vec::new();

        trace!(?surface, x = vector.x, y = vector.y, "joystick sample");

        // Screen Y grows downwards: pushing the stick up drives forwards.
        step_axis(
            &mut self.axes.moving,
            vector.y,
            threshold,
            policy,
            &AxisCommands {
                negative: RemoteCommand::Forward,
                positive: RemoteCommand::Backward,
            },
            &mut out,
        );
        step_axis(
            &mut self.axes.steering,
            vector.x,
            threshold,
            policy,
            &AxisCommands {
                negative: RemoteCommand::Left,
                positive: RemoteCommand::Right,
            },
            &mut out,
        );

        if !out.is_empty() {
            debug!(?surface, commands = ?out, "joystick edge");
        }
        out
    }
}

fn step_axis(
    state: &mut AxisState,
    value: f64,
    threshold: f64,
    policy: ReversalPolicy,
    commands: &AxisCommands,
    out: &mut Vec<RemoteCommand>,
) {
    let start = |direction: Direction| match direction {
        Direction::Negative => commands.negative.clone(),
        Direction::Positive => commands.positive.clone(),
    };

    match (classify(value, threshold), *state) {
        (Zone::Neutral, AxisState::Active(_)) => {
            out.push(RemoteCommand::Stop);
            *state = AxisState::Neutral;
        }
        (Zone::Active(direction), AxisState::Neutral) => {
            out.push(start(direction));
            *state = AxisState::Active(direction);
        }
        (Zone::Active(direction), AxisState::Active(current)) if direction != current => {
            if policy == ReversalPolicy::StopThenRestart {
                out.push(RemoteCommand::Stop);
                out.push(start(direction));
                *state = AxisState::Active(direction);
            }
        }
        _ => {}
    }
}
