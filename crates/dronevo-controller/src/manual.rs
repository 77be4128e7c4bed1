//! Controller driven by externally supplied commands.
//!
//! A [`ManualController`] ignores its observation and returns whatever command
//! was last set. Commands can be written compactly as key strings: any mix of
//! `u`, `d`, `l`, `r` (case-insensitive), or `.` / `-` for idle. For example
//! `"ur"` is up-and-right and `"."` is no input.

use std::str::FromStr;

use dronevo_engine::{ControlInput, Controller, Horizontal, Vertical};

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum ParseCommandError {
    #[display("unknown key {key:?} in command {command:?}")]
    UnknownKey { key: char, command: String },
    #[display("command {command:?} presses opposite keys on the same axis")]
    Conflicting { command: String },
}

/// Command parsed from a key string such as `"ul"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyCommand(pub ControlInput);

impl FromStr for KeyCommand {
    type Err = ParseCommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let conflicting = || ParseCommandError::Conflicting {
            command: s.to_owned(),
        };
        let mut input = ControlInput::IDLE;
        for key in s.trim().chars() {
            match key.to_ascii_lowercase() {
                'u' if input.vertical.is_down() => return Err(conflicting()),
                'd' if input.vertical.is_up() => return Err(conflicting()),
                'l' if input.horizontal.is_right() => return Err(conflicting()),
                'r' if input.horizontal.is_left() => return Err(conflicting()),
                'u' => input.vertical = Vertical::Up,
                'd' => input.vertical = Vertical::Down,
                'l' => input.horizontal = Horizontal::Left,
                'r' => input.horizontal = Horizontal::Right,
                '.' | '-' => {}
                _ => {
                    return Err(ParseCommandError::UnknownKey {
                        key,
                        command: s.to_owned(),
                    });
                }
            }
        }
        Ok(Self(input))
    }
}

#[derive(Debug, Default, Clone)]
pub struct ManualController {
    command: ControlInput,
}

impl ManualController {
    #[must_use]
    pub fn new(command: ControlInput) -> Self {
        Self { command }
    }

    pub fn set_command(&mut self, command: ControlInput) {
        self.command = command;
    }

    #[must_use]
    pub fn command(&self) -> ControlInput {
        self.command
    }
}

impl Controller for ManualController {
    fn act(&self, _observation: &[f32]) -> ControlInput {
        self.command
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_returns_last_command_regardless_of_observation() {
        let mut controller = ManualController::default();
        assert_eq!(controller.act(&[1.0, 2.0]), ControlInput::IDLE);

        let up_left = ControlInput::new(Vertical::Up, Horizontal::Left);
        controller.set_command(up_left);
        assert_eq!(controller.act(&[]), up_left);
        assert_eq!(controller.act(&[0.0; 6]), up_left);
        assert_eq!(controller.command(), up_left);
    }

    #[test]
    fn test_parse_key_commands() {
        let parse = |s: &str| s.parse::<KeyCommand>().map(|c| c.0);
        assert_eq!(parse("."), Ok(ControlInput::IDLE));
        assert_eq!(parse(""), Ok(ControlInput::IDLE));
        assert_eq!(
            parse("UR"),
            Ok(ControlInput::new(Vertical::Up, Horizontal::Right))
        );
        assert_eq!(
            parse("l"),
            Ok(ControlInput::new(Vertical::Idle, Horizontal::Left))
        );
        assert_eq!(
            parse("dd"),
            Ok(ControlInput::new(Vertical::Down, Horizontal::Idle))
        );
    }

    #[test]
    fn test_parse_rejects_bad_keys() {
        assert!(matches!(
            "ux".parse::<KeyCommand>(),
            Err(ParseCommandError::UnknownKey { key: 'x', .. })
        ));
        assert!(matches!(
            "ud".parse::<KeyCommand>(),
            Err(ParseCommandError::Conflicting { .. })
        ));
        assert!(matches!(
            "rl".parse::<KeyCommand>(),
            Err(ParseCommandError::Conflicting { .. })
        ));
    }
}
