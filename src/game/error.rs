//! Error types for the game engine

use super::judge::JudgeError;
use std::fmt;

/// Setup problems. Surfaced to the setup screen, never silently clamped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    /// Not enough names to play
    TooFewPlayers { found: usize, required: usize },
    /// Role counts would leave no civilian
    TooManyImpostors { impostors: usize, players: usize },
    /// A player name was empty after trimming
    BlankName { index: usize },
    /// A secret word was empty after trimming
    BlankWord,
    /// The word catalogue has no entries
    EmptyWordBank,
    /// A catalogue line could not be parsed
    MalformedWordBank { line: usize },
}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigurationError::TooFewPlayers { found, required } => {
                write!(f, "need at least {} players, have {}", required, found)
            }
            ConfigurationError::TooManyImpostors { impostors, players } => write!(
                f,
                "{} impostors leave no civilian among {} players",
                impostors, players
            ),
            ConfigurationError::BlankName { index } => {
                write!(f, "player {} has an empty name", index + 1)
            }
            ConfigurationError::BlankWord => write!(f, "both secret words are required"),
            ConfigurationError::EmptyWordBank => write!(f, "word catalogue is empty"),
            ConfigurationError::MalformedWordBank { line } => {
                write!(f, "word catalogue line {} must look like `word|undercover`", line)
            }
        }
    }
}

impl std::error::Error for ConfigurationError {}

/// Errors raised by engine operations.
/// A failed operation leaves the roster and the current state untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    /// Invalid setup
    Configuration(ConfigurationError),
    /// Operation attempted outside its valid state
    InvalidTransition {
        operation: &'static str,
        state: &'static str,
    },
    /// The guess judge could not be reached; the guess may be retried
    JudgeUnavailable(JudgeError),
}

impl GameError {
    pub(crate) fn invalid(operation: &'static str, state: &'static str) -> Self {
        GameError::InvalidTransition { operation, state }
    }
}

impl fmt::Display for GameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameError::Configuration(e) => write!(f, "configuration error: {}", e),
            GameError::InvalidTransition { operation, state } => {
                write!(f, "cannot {} while {}", operation, state)
            }
            GameError::JudgeUnavailable(e) => write!(f, "judge unavailable: {}", e),
        }
    }
}

impl std::error::Error for GameError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GameError::Configuration(e) => Some(e),
            GameError::JudgeUnavailable(e) => Some(e),
            GameError::InvalidTransition { .. } => None,
        }
    }
}

impl From<ConfigurationError> for GameError {
    fn from(e: ConfigurationError) -> Self {
        GameError::Configuration(e)
    }
}

impl From<JudgeError> for GameError {
    fn from(e: JudgeError) -> Self {
        GameError::JudgeUnavailable(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_format() {
        assert_eq!(
            ConfigurationError::TooFewPlayers {
                found: 2,
                required: 3
            }
            .to_string(),
            "need at least 3 players, have 2"
        );
        assert_eq!(
            GameError::invalid("submit a vote", "giving clues").to_string(),
            "cannot submit a vote while giving clues"
        );
        assert_eq!(
            GameError::from(ConfigurationError::BlankName { index: 0 }).to_string(),
            "configuration error: player 1 has an empty name"
        );
    }
}
