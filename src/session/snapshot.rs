//! Point-in-time copies of a session.
//!
//! `SessionSnapshot` is captured after every mutation and shared behind an
//! `Arc`. It holds every hand, so it never goes on the wire directly:
//! `SessionSnapshot::view_for` filters it down to what one viewer may see.

use serde::Serialize;

use crate::cards::Card;
use crate::core::PlayerId;
use crate::players::Hand;
use crate::rules::{GameResult, WildBias, WinReason};
use crate::turns::Direction;

use super::state::{GameId, PlayRecord, Session, SessionState};

/// Public facts about one seat.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    pub id: PlayerId,
    pub name: String,
    pub position: u32,
    pub card_count: usize,
    pub is_active: bool,
    pub is_blocked: bool,
    pub has_double: bool,
}

/// Full session state at one version.
#[derive(Clone, Debug)]
pub struct SessionSnapshot {
    pub game_id: GameId,
    pub version: u64,
    pub state: SessionState,
    pub direction: Direction,
    pub current_player: Option<PlayerId>,
    pub turn: u32,
    pub result: Option<GameResult>,
    pub win_threshold: u32,
    pub top_card: Option<Card>,
    pub wild_bias: Option<WildBias>,
    pub draw_pile_count: usize,
    pub discard_pile_count: usize,
    pub players: Vec<PlayerView>,
    /// Hands in seat order.
    hands: Vec<Hand>,
    /// Playable indices of the current player.
    playable: Vec<usize>,
    pub last_play: Option<PlayRecord>,
}

/// What one connection sees.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientView {
    pub game_id: GameId,
    pub version: u64,
    pub state: SessionState,
    pub direction: Direction,
    pub current_player: Option<PlayerId>,
    pub turn: u32,
    pub winner: Option<PlayerId>,
    pub win_reason: Option<WinReason>,
    pub win_threshold: u32,
    pub top_card: Option<Card>,
    pub wild_bias: Option<WildBias>,
    pub draw_pile_count: usize,
    pub discard_pile_count: usize,
    pub players: Vec<PlayerView>,
    pub you: Option<PlayerId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hand: Option<Hand>,
    pub playable: Vec<usize>,
    pub last_play: Option<PlayRecord>,
}

impl SessionSnapshot {
    pub(crate) fn capture(session: &Session) -> Self {
        let players = session
            .players()
            .iter()
            .map(|p| PlayerView {
                id: p.id(),
                name: p.name().to_string(),
                position: p.position(),
                card_count: p.hand().len(),
                is_active: p.is_active(),
                is_blocked: p.is_blocked(),
                has_double: p.has_double(),
            })
            .collect();
        let hands = session.players().iter().map(|p| p.hand().clone()).collect();
        let current_player = session.current_player();
        let playable = current_player.map_or_else(Vec::new, |p| session.playable_indices(p));

        Self {
            game_id: session.id().clone(),
            version: session.version(),
            state: session.state(),
            direction: session.direction(),
            current_player,
            turn: session.turn_number(),
            result: session.result(),
            win_threshold: session.config().win_threshold,
            top_card: session.top_card().copied(),
            wild_bias: session.wild_bias(),
            draw_pile_count: session.deck().draw_count(),
            discard_pile_count: session.deck().discard_count(),
            players,
            hands,
            playable,
            last_play: session.history().last().cloned(),
        }
    }

    /// Hand of one seat at this version.
    #[must_use]
    pub fn hand(&self, player: PlayerId) -> Option<&Hand> {
        self.hands.get(player.index())
    }

    /// Filter to what `viewer` may see. `None` is a spectator.
    #[must_use]
    pub fn view_for(&self, viewer: Option<PlayerId>) -> ClientView {
        let hand = viewer.and_then(|v| self.hand(v)).cloned();
        let playable = match viewer {
            Some(v) if self.current_player == Some(v) => self.playable.clone(),
            _ => Vec::new(),
        };

        ClientView {
            game_id: self.game_id.clone(),
            version: self.version,
            state: self.state,
            direction: self.direction,
            current_player: self.current_player,
            turn: self.turn,
            winner: self.result.and_then(|r| r.winner()),
            win_reason: match self.result {
                Some(GameResult::Winner { reason, .. }) => Some(reason),
                _ => None,
            },
            win_threshold: self.win_threshold,
            top_card: self.top_card,
            wild_bias: self.wild_bias,
            draw_pile_count: self.draw_pile_count,
            discard_pile_count: self.discard_pile_count,
            players: self.players.clone(),
            you: viewer,
            hand,
            playable,
            last_play: self.last_play.clone(),
        }
    }
}
