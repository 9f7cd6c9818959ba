//! Turn order: current seat, direction, skips and blocks.
//!
//! The engine only stores the current seat and the direction. Everything
//! it needs to know about players (active, blocked) is read from the
//! `PlayerRegistry` passed into each call, so the registry remains the
//! single owner of player state.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::core::{GameError, PlayerId};
use crate::players::PlayerRegistry;

/// Direction of travel around the table.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Increasing seat index.
    #[default]
    Forward,
    /// Decreasing seat index.
    Backward,
}

impl Direction {
    #[must_use]
    pub const fn flipped(self) -> Self {
        match self {
            Direction::Forward => Direction::Backward,
            Direction::Backward => Direction::Forward,
        }
    }
}

/// What happened when the turn passed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TurnChange {
    /// Seat that held the turn before.
    pub from: PlayerId,
    /// Seat that holds the turn now.
    pub to: PlayerId,
    /// Seats passed over on the way, by skip or block, in order.
    pub skipped: SmallVec<[PlayerId; 4]>,
}

/// Result of a reverse.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReverseOutcome {
    /// Direction flipped; the turn passes normally.
    Flipped,
    /// Direction flipped, but with two active players a reverse hands the
    /// turn straight back, so the caller must treat it as a skip.
    ActsAsSkip,
}

/// Turn state machine over the current seat and direction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TurnEngine {
    current: PlayerId,
    direction: Direction,
}

impl TurnEngine {
    /// Start with `first` to act, moving forward.
    #[must_use]
    pub fn new(first: PlayerId) -> Self {
        Self {
            current: first,
            direction: Direction::Forward,
        }
    }

    #[must_use]
    pub fn current(&self) -> PlayerId {
        self.current
    }

    #[must_use]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// The active seat one step from `from` in the current direction.
    ///
    /// Returns `None` if no seat is active.
    #[must_use]
    pub fn next_after(&self, from: PlayerId, players: &PlayerRegistry) -> Option<PlayerId> {
        let seats = players.len();
        if seats == 0 {
            return None;
        }
        let mut index = from.index() % seats;
        for _ in 0..seats {
            index = match self.direction {
                Direction::Forward => (index + 1) % seats,
                Direction::Backward => (index + seats - 1) % seats,
            };
            let Ok(seat) = u8::try_from(index) else { continue };
            let candidate = PlayerId::new(seat);
            if players.is_active(candidate) {
                return Some(candidate);
            }
        }
        None
    }

    /// Move the turn one active seat along, ignoring blocks.
    ///
    /// Stays put when no seat is active.
    pub fn advance(&mut self, players: &PlayerRegistry) -> PlayerId {
        if let Some(next) = self.next_after(self.current, players) {
            self.current = next;
        }
        self.current
    }

    /// Flip direction.
    pub fn reverse(&mut self, players: &PlayerRegistry) -> ReverseOutcome {
        self.direction = self.direction.flipped();
        if players.active_count() == 2 {
            ReverseOutcome::ActsAsSkip
        } else {
            ReverseOutcome::Flipped
        }
    }

    /// Pass the turn to the next seat that is allowed to act.
    ///
    /// Arriving at a blocked player clears their block and passes over
    /// them once.
    pub fn end_turn(&mut self, players: &mut PlayerRegistry) -> TurnChange {
        let from = self.current;
        let mut skipped = SmallVec::new();
        self.advance(players);
        self.pass_blocked(players, &mut skipped);
        TurnChange {
            from,
            to: self.current,
            skipped,
        }
    }

    /// Pass over the next player, then end the turn.
    ///
    /// A skipped player who was already blocked has the block consumed by
    /// the skip instead of losing a second turn.
    pub fn skip_next(&mut self, players: &mut PlayerRegistry) -> TurnChange {
        let from = self.current;
        let mut skipped = SmallVec::new();

        let victim = self.advance(players);
        if victim != from {
            if let Ok(player) = players.get_mut(victim) {
                player.is_blocked = false;
            }
            skipped.push(victim);
        }

        self.advance(players);
        self.pass_blocked(players, &mut skipped);
        TurnChange {
            from,
            to: self.current,
            skipped,
        }
    }

    /// Block `target`: on their next arrival the turn passes over them.
    pub fn apply_block(&self, players: &mut PlayerRegistry, target: PlayerId) -> Result<(), GameError> {
        let player = players.get_mut(target)?;
        player.is_blocked = true;
        Ok(())
    }

    fn pass_blocked(&mut self, players: &mut PlayerRegistry, skipped: &mut SmallVec<[PlayerId; 4]>) {
        // Every pass clears one block, so this ends within one lap.
        for _ in 0..=players.len() {
            let blocked = match players.get_mut(self.current) {
                Ok(player) if player.is_active && player.is_blocked => {
                    player.is_blocked = false;
                    true
                }
                _ => false,
            };
            if !blocked {
                break;
            }
            skipped.push(self.current);
            self.advance(players);
        }
    }
}
