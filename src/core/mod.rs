//! Core types shared by every layer: seats, RNG, rule constants, errors.

pub mod config;
pub mod error;
pub mod player;
pub mod rng;

pub use config::{GameConfig, FINISH_REACH, HAND_SIZE, MAX_PLAYERS, MIN_PLAYERS, WIN_THRESHOLD};
pub use error::{ErrorKind, GameError};
pub use player::PlayerId;
pub use rng::{GameRng, GameRngState};
