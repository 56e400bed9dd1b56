//! Outbound command validation
//!
//! Continuous seeks are two commands on the wire (`Start*` then `End*`) with
//! no session object tying them together. The validator makes that session
//! explicit as one small state machine per direction:
//!
//! ```text
//!            Start*                End*
//!   Idle ─────────────▶ Seeking ─────────────▶ Idle
//!    │                    │  ▲
//!    │ End* → rejected    └──┘ Start* (stays Seeking)
//! ```
//!
//! Every other command is stateless and valid whenever its options are.

use parking_lot::Mutex;

use crate::command::{CommandOptions, PlaybackCommand, SeekDirection, SeekEdge};
use crate::error::{ApiError, Result};

/// Per-direction seek session state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SeekState {
    #[default]
    Idle,
    Seeking,
}

/// A seek state change applied by a successful validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeekTransition {
    pub direction: SeekDirection,
    pub from: SeekState,
    pub to: SeekState,
}

/// A command that passed validation
///
/// Only [`CommandValidator`] can build one, so holding a `ValidatedCommand`
/// is proof the command is known and correctly ordered.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedCommand {
    command: PlaybackCommand,
    options: Option<CommandOptions>,
    transition: Option<SeekTransition>,
}

impl ValidatedCommand {
    pub fn command(&self) -> PlaybackCommand {
        self.command
    }

    pub fn code(&self) -> u32 {
        self.command.code()
    }

    pub fn options(&self) -> Option<&CommandOptions> {
        self.options.as_ref()
    }

    pub fn transition(&self) -> Option<SeekTransition> {
        self.transition
    }

    pub(crate) fn into_parts(self) -> (PlaybackCommand, Option<CommandOptions>) {
        (self.command, self.options)
    }
}

#[derive(Debug, Default)]
struct SeekSessions {
    forward: SeekState,
    backward: SeekState,
}

impl SeekSessions {
    fn get_mut(&mut self, direction: SeekDirection) -> &mut SeekState {
        match direction {
            SeekDirection::Forward => &mut self.forward,
            SeekDirection::Backward => &mut self.backward,
        }
    }
}

/// Validates and normalizes playback commands before dispatch
#[derive(Debug, Default)]
pub struct CommandValidator {
    sessions: Mutex<SeekSessions>,
}

impl CommandValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate a raw wire code
    ///
    /// Codes outside `0..=13` yield [`ApiError::UnknownCommand`].
    pub fn validate_code(
        &self,
        code: u32,
        options: Option<CommandOptions>,
    ) -> Result<ValidatedCommand> {
        let command = PlaybackCommand::try_from(code)?;
        self.validate(command, options)
    }

    /// Validate a typed command, advancing the seek state machine on success
    pub fn validate(
        &self,
        command: PlaybackCommand,
        options: Option<CommandOptions>,
    ) -> Result<ValidatedCommand> {
        if let Some(options) = &options {
            options.check()?;
        }
        // Empty option maps are sent as "no options"
        let options = options.filter(|o| !o.is_empty());

        let transition = match command.seek_edge() {
            None => None,
            Some((direction, edge)) => {
                let mut sessions = self.sessions.lock();
                let state = sessions.get_mut(direction);
                let from = *state;
                let to = match (edge, from) {
                    (SeekEdge::Start, _) => SeekState::Seeking,
                    (SeekEdge::End, SeekState::Seeking) => SeekState::Idle,
                    (SeekEdge::End, SeekState::Idle) => {
                        tracing::debug!("Rejecting {} with no {:?} seek active", command, direction);
                        return Err(ApiError::OutOfOrderCommand { command, direction });
                    }
                };
                *state = to;
                Some(SeekTransition {
                    direction,
                    from,
                    to,
                })
            }
        };

        Ok(ValidatedCommand {
            command,
            options,
            transition,
        })
    }

    /// Undo the seek transition of a command that could not be sent
    ///
    /// Only rolls back if nothing else moved the state in the meantime.
    pub fn restore(&self, validated: &ValidatedCommand) {
        if let Some(transition) = validated.transition {
            let mut sessions = self.sessions.lock();
            let state = sessions.get_mut(transition.direction);
            if *state == transition.to {
                *state = transition.from;
            }
        }
    }

    /// Current session state for one direction
    pub fn seek_state(&self, direction: SeekDirection) -> SeekState {
        *self.sessions.lock().get_mut(direction)
    }

    /// Drop any half-finished seek sessions
    pub fn reset(&self) {
        *self.sessions.lock() = SeekSessions::default();
    }
}
