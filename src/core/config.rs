//! Rule constants for a session.
//!
//! `GameConfig` is deserializable so the server can read it from the
//! `[game]` table of `bunnyhop.toml`. Every field has a default, so an
//! empty table is a valid configuration.

use serde::{Deserialize, Serialize};

/// Position a player must reach to win.
pub const WIN_THRESHOLD: u32 = 20;

/// Printed value of a finish card. A finish play is legal once
/// `position + FINISH_REACH >= WIN_THRESHOLD`.
pub const FINISH_REACH: u32 = 5;

/// Cards dealt to each player on START; also the steady-state hand size.
pub const HAND_SIZE: usize = 7;

/// Largest session the protocol accepts.
pub const MAX_PLAYERS: usize = 4;

/// Smallest session that can START.
pub const MIN_PLAYERS: usize = 2;

/// Per-session rule configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Position that wins the game.
    pub win_threshold: u32,

    /// Value printed on finish cards.
    pub finish_reach: u32,

    /// Initial (and steady-state) hand size.
    pub hand_size: usize,

    /// Seats available per session.
    pub max_players: usize,

    /// Players needed before START succeeds.
    pub min_players: usize,

    /// Master seed for deck shuffles. `None` seeds from the clock.
    pub seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            win_threshold: WIN_THRESHOLD,
            finish_reach: FINISH_REACH,
            hand_size: HAND_SIZE,
            max_players: MAX_PLAYERS,
            min_players: MIN_PLAYERS,
            seed: None,
        }
    }
}

impl GameConfig {
    /// Set the win threshold.
    #[must_use]
    pub fn with_win_threshold(mut self, threshold: u32) -> Self {
        self.win_threshold = threshold;
        self
    }

    /// Set the hand size.
    #[must_use]
    pub fn with_hand_size(mut self, size: usize) -> Self {
        self.hand_size = size;
        self
    }

    /// Set the master seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Clamp a requested seat count the way CREATE does: anything outside
    /// `min_players..=max_players` falls back to `max_players`.
    #[must_use]
    pub fn clamp_seats(&self, requested: usize) -> usize {
        if (self.min_players..=self.max_players).contains(&requested) {
            requested
        } else {
            self.max_players
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GameConfig::default();
        assert_eq!(config.win_threshold, 20);
        assert_eq!(config.finish_reach, 5);
        assert_eq!(config.hand_size, 7);
        assert_eq!(config.max_players, 4);
        assert_eq!(config.min_players, 2);
        assert_eq!(config.seed, None);
    }

    #[test]
    fn test_clamp_seats() {
        let config = GameConfig::default();
        assert_eq!(config.clamp_seats(2), 2);
        assert_eq!(config.clamp_seats(4), 4);
        assert_eq!(config.clamp_seats(1), 4);
        assert_eq!(config.clamp_seats(9), 4);
    }

    #[test]
    fn test_partial_toml() {
        let config: GameConfig = toml::from_str("win_threshold = 15\nseed = 3").unwrap();
        assert_eq!(config.win_threshold, 15);
        assert_eq!(config.seed, Some(3));
        assert_eq!(config.hand_size, HAND_SIZE);
    }
}
