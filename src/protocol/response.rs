//! Responses and pushed updates, one JSON object per line.

use serde::Serialize;

use crate::core::{ErrorKind, GameError, PlayerId};
use crate::rules::{GameResult, WinReason};
use crate::session::{ClientView, DrawOutcome, GameId, PlayRecord};

/// Final outcome carried by a PLAY response that ended the game.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Outcome {
    pub winner: Option<PlayerId>,
    pub reason: Option<WinReason>,
}

impl From<GameResult> for Outcome {
    fn from(result: GameResult) -> Self {
        match result {
            GameResult::Winner { player, reason } => Outcome {
                winner: Some(player),
                reason: Some(reason),
            },
            GameResult::NoWinner => Outcome {
                winner: None,
                reason: None,
            },
        }
    }
}

/// Everything the server writes to a connection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Response {
    #[serde(rename_all = "camelCase")]
    Created { game_id: GameId, player_id: PlayerId },
    #[serde(rename_all = "camelCase")]
    Joined { game_id: GameId, player_id: PlayerId },
    #[serde(rename_all = "camelCase")]
    Started { game_id: GameId },
    #[serde(rename_all = "camelCase")]
    Played {
        play: PlayRecord,
        #[serde(skip_serializing_if = "Option::is_none")]
        finished: Option<Outcome>,
    },
    Drew { draw: DrawOutcome },
    State { snapshot: ClientView },
    #[serde(rename_all = "camelCase")]
    Left { game_id: GameId },
    /// Pushed after every mutation of the session a connection belongs to.
    Update { snapshot: ClientView },
    #[serde(rename_all = "camelCase")]
    Error { error_kind: ErrorKind, message: String },
}

impl Response {
    #[must_use]
    pub fn error(err: &GameError) -> Self {
        Response::Error {
            error_kind: err.kind(),
            message: err.to_string(),
        }
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, Response::Error { .. })
    }

    /// Encode as a single line, without the trailing newline.
    pub fn to_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl From<GameError> for Response {
    fn from(err: GameError) -> Self {
        Response::error(&err)
    }
}
