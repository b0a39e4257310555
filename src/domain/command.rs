//! Outbound Command Vocabulary
//!
//! Every frame the application writes to the device is one line of UTF-8
//! text taken from this fixed vocabulary.

use std::fmt;

/// Commands understood by the wheelchair controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCommand {
    /// Drive forwards
    Forward,
    /// Drive backwards
    Backward,
    /// Turn left
    Left,
    /// Turn right
    Right,
    /// Stop all motion
    Stop,
    LightOn,
    LightOff,
    AlarmOn,
    AlarmOff,
    IncreaseSpeed,
    DecreaseSpeed,
    /// Switch the device into a named driving mode
    SelectMode(String),
    /// Return the device to its initial state
    Reset,
    /// Authorise this link; must be the first frame after the link opens
    AccessToken(String),
}

impl RemoteCommand {
    /// Wire form of the command.
    pub fn to_frame(&self) -> String {
        match self {
            Self::SelectMode(mode) => format!("select_mode:{}", mode),
            Self::AccessToken(token) => format!("access_token:{}", token),
            other => other.fixed_frame().to_string(),
        }
    }

    fn fixed_frame(&self) -> &'static str {
        match self {
            Self::Forward => "remote:forward",
            Self::Backward => "remote:backward",
            Self::Left => "remote:left",
            Self::Right => "remote:right",
            Self::Stop => "remote:stop",
            Self::LightOn => "remote:light_on",
            Self::LightOff => "remote:light_off",
            Self::AlarmOn => "remote:alarm_on",
            Self::AlarmOff => "remote:alarm_off",
            Self::IncreaseSpeed => "remote:increase_speed",
            Self::DecreaseSpeed => "remote:decrease_speed",
            Self::Reset => "reset",
            Self::SelectMode(_) => "select_mode",
            Self::AccessToken(_) => "access_token",
        }
    }
}

/// Log-safe rendering: the token itself never reaches the logs.
impl fmt::Display for RemoteCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AccessToken(_) => f.write_str("access_token:<redacted>"),
            other => f.write_str(&other.to_frame()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_motion_frames() {
        assert_eq!(RemoteCommand::Forward.to_frame(), "remote:forward");
        assert_eq!(RemoteCommand::Backward.to_frame(), "remote:backward");
        assert_eq!(RemoteCommand::Left.to_frame(), "remote:left");
        assert_eq!(RemoteCommand::Right.to_frame(), "remote:right");
        assert_eq!(RemoteCommand::Stop.to_frame(), "remote:stop");
    }

    #[test]
    fn test_accessory_frames() {
        assert_eq!(RemoteCommand::LightOn.to_frame(), "remote:light_on");
        assert_eq!(RemoteCommand::AlarmOff.to_frame(), "remote:alarm_off");
        assert_eq!(
            RemoteCommand::IncreaseSpeed.to_frame(),
            "remote:increase_speed"
        );
        assert_eq!(RemoteCommand::Reset.to_frame(), "reset");
    }

    #[test]
    fn test_parameterised_frames() {
        assert_eq!(
            RemoteCommand::SelectMode("indoor".into()).to_frame(),
            "select_mode:indoor"
        );
        assert_eq!(
            RemoteCommand::AccessToken("abc.def".into()).to_frame(),
            "access_token:abc.def"
        );
    }

    #[test]
    fn test_display_redacts_token() {
        let cmd = RemoteCommand::AccessToken("abc.def".into());
        assert_eq!(cmd.to_string(), "access_token:<redacted>");
        assert_eq!(RemoteCommand::LightOff.to_string(), "remote:light_off");
    }
}
