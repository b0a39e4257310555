//! Direction pad
//!
//! A held button drives in its direction; letting go stops. Only changes in
//! the held button produce input, so holding a button sends its move once.

use crate::domain::dispatcher::ControlInput;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PadDirection {
    Up,
    Down,
    Left,
    Right,
}

impl PadDirection {
    fn input(self) -> ControlInput {
        match self {
            PadDirection::Up => ControlInput::MoveUp,
            PadDirection::Down => ControlInput::MoveDown,
            PadDirection::Left => ControlInput::MoveLeft,
            PadDirection::Right => ControlInput::MoveRight,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PadState {
    held: Option<PadDirection>,
}

impl PadState {
    pub fn held(&self) -> Option<PadDirection> {
        self.held
    }

    /// Feed the button held this frame and get the inputs to forward.
    /// Switching buttons stops before starting the new direction.
    pub fn update(&mut self, held: Option<PadDirection>) -> Vec<ControlInput> {
        if held == self.held {
            return Vec::new();
        }
        let mut out = Vec::with_capacity(2);
        if self.held.is_some() {
            out.push(ControlInput::StopMoving);
        }
        if let Some(direction) = held {
            out.push(direction.input());
        }
        self.held = held;
        out
    }

    /// Forget the held button without emitting anything.
    pub fn clear(&mut self) {
        self.held = None;
    }
}
