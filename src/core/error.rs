//! Game rule errors.
//!
//! Every rejected command is reported as a `GameError`. None of them leave
//! partial changes behind: the session validates before it mutates.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::player::PlayerId;

/// Errors returned by session operations.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("game '{0}' not found")]
    GameNotFound(String),

    #[error("game is full ({max} players)")]
    GameFull { max: usize },

    #[error("game already started")]
    AlreadyStarted,

    #[error("need at least {needed} players to start, have {have}")]
    NotEnoughPlayers { needed: usize, have: usize },

    #[error("not your turn: waiting for player {current}")]
    NotYourTurn { current: PlayerId },

    #[error("invalid play: {0}")]
    InvalidPlay(String),

    /// Draw pile exhausted. Recovered by reshuffling; never reaches a client.
    #[error("draw pile is empty")]
    EmptyDeck,

    #[error("player {0} has disconnected")]
    PlayerDisconnected(PlayerId),

    #[error("game has not started")]
    NotStarted,

    #[error("game is finished")]
    GameFinished,

    #[error("player {0} is not in this game")]
    PlayerNotFound(PlayerId),

    #[error("create or join a game first")]
    NotInGame,

    #[error("already in game '{0}'")]
    AlreadyInGame(String),

    #[error("malformed command: {0}")]
    MalformedCommand(String),
}

/// Wire-visible error category (`errorKind` in responses).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    GameNotFound,
    GameFull,
    AlreadyStarted,
    NotEnoughPlayers,
    NotYourTurn,
    InvalidPlay,
    EmptyDeck,
    PlayerDisconnected,
    NotStarted,
    GameFinished,
    PlayerNotFound,
    NotInGame,
    AlreadyInGame,
    MalformedCommand,
}

impl GameError {
    /// Category of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            GameError::GameNotFound(_) => ErrorKind::GameNotFound,
            GameError::GameFull { .. } => ErrorKind::GameFull,
            GameError::AlreadyStarted => ErrorKind::AlreadyStarted,
            GameError::NotEnoughPlayers { .. } => ErrorKind::NotEnoughPlayers,
            GameError::NotYourTurn { .. } => ErrorKind::NotYourTurn,
            GameError::InvalidPlay(_) => ErrorKind::InvalidPlay,
            GameError::EmptyDeck => ErrorKind::EmptyDeck,
            GameError::PlayerDisconnected(_) => ErrorKind::PlayerDisconnected,
            GameError::NotStarted => ErrorKind::NotStarted,
            GameError::GameFinished => ErrorKind::GameFinished,
            GameError::PlayerNotFound(_) => ErrorKind::PlayerNotFound,
            GameError::NotInGame => ErrorKind::NotInGame,
            GameError::AlreadyInGame(_) => ErrorKind::AlreadyInGame,
            GameError::MalformedCommand(_) => ErrorKind::MalformedCommand,
        }
    }

    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        GameError::InvalidPlay(reason.into())
    }
}
