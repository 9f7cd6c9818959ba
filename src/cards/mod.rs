//! Cards and the shared deck.
//!
//! ## Key Types
//!
//! - `Card`: immutable card value (`kind`, `color`, `value`)
//! - `Deck`: draw pile + discard pile with reshuffle-on-empty
//! - `standard_deck`: the 52-card pool every session starts from

pub mod card;
pub mod deck;

pub use card::{standard_deck, Card, CardId, CardKind, Color};
pub use deck::{Dealt, Deck};
