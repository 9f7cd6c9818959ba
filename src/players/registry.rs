//! Players, hands and the seat registry of one session.
//!
//! The registry owns every `Player` in seat order. Seats are assigned on
//! JOIN and frozen on START: nobody is removed afterwards, disconnected
//! players are only flagged inactive so seat indices stay stable.

use serde::Serialize;

use crate::cards::Card;
use crate::core::{GameError, PlayerId};
use crate::session::SessionState;

/// Cards held by one player, in the order they were received.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Hand(Vec<Card>);

impl Hand {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Card at `index`, if any.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Card> {
        self.0.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Card> {
        self.0.iter()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Card] {
        &self.0
    }

    pub(crate) fn push(&mut self, card: Card) {
        self.0.push(card);
    }

    pub(crate) fn extend(&mut self, cards: impl IntoIterator<Item = Card>) {
        self.0.extend(cards);
    }

    /// Remove the card at `index`, keeping the order of the rest.
    pub(crate) fn take(&mut self, index: usize) -> Option<Card> {
        (index < self.0.len()).then(|| self.0.remove(index))
    }
}

/// A seated player.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Player {
    id: PlayerId,
    name: String,
    pub(crate) position: u32,
    pub(crate) is_active: bool,
    pub(crate) is_blocked: bool,
    pub(crate) has_double: bool,
    pub(crate) hand: Hand,
}

impl Player {
    fn new(id: PlayerId, name: String) -> Self {
        Self {
            id,
            name,
            position: 0,
            is_active: true,
            is_blocked: false,
            has_double: false,
            hand: Hand::new(),
        }
    }

    #[must_use]
    pub fn id(&self) -> PlayerId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn position(&self) -> u32 {
        self.position
    }

    /// Still taking turns (not disconnected).
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.is_active
    }

    /// Loses their next turn.
    #[must_use]
    pub fn is_blocked(&self) -> bool {
        self.is_blocked
    }

    /// Next hop counts twice.
    #[must_use]
    pub fn has_double(&self) -> bool {
        self.has_double
    }

    #[must_use]
    pub fn hand(&self) -> &Hand {
        &self.hand
    }

    /// Move forward `spaces`. Positions only grow, so they stay non-negative.
    pub(crate) fn advance(&mut self, spaces: u32) {
        self.position = self.position.saturating_add(spaces);
    }
}

/// Most seats a registry hands out; one per `u8` seat id.
pub const SEAT_LIMIT: usize = u8::MAX as usize + 1;

/// Seat registry for one session.
#[derive(Clone, Debug)]
pub struct PlayerRegistry {
    players: Vec<Player>,
    max_players: usize,
}

impl PlayerRegistry {
    /// Create an empty registry with `max_players` seats.
    ///
    /// Seat ids are a `u8`, so anything above [`SEAT_LIMIT`] is capped.
    #[must_use]
    pub fn new(max_players: usize) -> Self {
        let max_players = max_players.min(SEAT_LIMIT);
        Self {
            players: Vec::with_capacity(max_players),
            max_players,
        }
    }

    /// Seat a new player.
    ///
    /// Fails with `AlreadyStarted` unless the session is still waiting, and
    /// with `GameFull` once every seat is taken. A seat given up before the
    /// game started goes to the next player who registers.
    pub fn register(&mut self, name: impl Into<String>, state: SessionState) -> Result<PlayerId, GameError> {
        match state {
            SessionState::Waiting => {}
            SessionState::InProgress => return Err(GameError::AlreadyStarted),
            SessionState::Finished => return Err(GameError::GameFinished),
        }
        if let Some(seat) = self.players.iter_mut().find(|p| !p.is_active) {
            let id = seat.id;
            *seat = Player::new(id, name.into());
            return Ok(id);
        }
        let full = GameError::GameFull { max: self.max_players };
        if self.players.len() >= self.max_players {
            return Err(full);
        }
        let id = u8::try_from(self.players.len()).map(PlayerId::new).map_err(|_| full)?;
        self.players.push(Player::new(id, name.into()));
        Ok(id)
    }

    /// Live hand of a player.
    pub fn hand_of(&self, id: PlayerId) -> Result<&Hand, GameError> {
        self.get(id).map(Player::hand)
    }

    pub fn get(&self, id: PlayerId) -> Result<&Player, GameError> {
        self.players.get(id.index()).ok_or(GameError::PlayerNotFound(id))
    }

    pub(crate) fn get_mut(&mut self, id: PlayerId) -> Result<&mut Player, GameError> {
        self.players.get_mut(id.index()).ok_or(GameError::PlayerNotFound(id))
    }

    /// Seated players (active or not).
    #[must_use]
    pub fn len(&self) -> usize {
        self.players.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    #[must_use]
    pub fn max_players(&self) -> usize {
        self.max_players
    }

    /// Is `id` seated and still active?
    #[must_use]
    pub fn is_active(&self, id: PlayerId) -> bool {
        self.players.get(id.index()).map_or(false, |p| p.is_active)
    }

    #[must_use]
    pub fn active_count(&self) -> usize {
        self.players.iter().filter(|p| p.is_active).count()
    }

    /// Active players in seat order.
    pub fn active_ids(&self) -> impl Iterator<Item = PlayerId> + '_ {
        self.players.iter().filter(|p| p.is_active).map(|p| p.id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Player> {
        self.players.iter()
    }

    /// Total cards in all hands.
    #[must_use]
    pub fn cards_in_hands(&self) -> usize {
        self.players.iter().map(|p| p.hand.len()).sum()
    }
}
