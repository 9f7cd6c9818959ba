//! Draw and discard piles.
//!
//! Both piles are `im::Vector`s so a session snapshot can clone them in
//! O(1). The top of each pile is its last element.
//!
//! ## Exhaustion
//!
//! `deal` fails with [`GameError::EmptyDeck`] when the draw pile cannot
//! cover the request. Callers never see that error: `deal_recovering`
//! reshuffles the discard pile (everything except the current top card)
//! back into the draw pile and retries.

use im::Vector;
use smallvec::SmallVec;
use tracing::{debug, warn};

use super::card::Card;
use crate::core::{GameError, GameRng};

/// Cards dealt in one call. Sized for a full starting hand.
pub type Dealt = SmallVec<[Card; 8]>;

/// The shared card pool of one session.
#[derive(Clone, Debug, Default)]
pub struct Deck {
    draw_pile: Vector<Card>,
    discard_pile: Vector<Card>,
}

impl Deck {
    /// Create a deck whose draw pile holds `cards`, last card on top.
    #[must_use]
    pub fn new(cards: impl IntoIterator<Item = Card>) -> Self {
        Self {
            draw_pile: cards.into_iter().collect(),
            discard_pile: Vector::new(),
        }
    }

    /// Shuffle the draw pile with the session RNG.
    pub fn shuffle(&mut self, rng: &mut GameRng) {
        let mut cards: Vec<Card> = self.draw_pile.iter().copied().collect();
        rng.shuffle(&mut cards);
        self.draw_pile = cards.into_iter().collect();
    }

    /// Shuffle the draw pile deterministically from `seed`.
    pub fn shuffle_seeded(&mut self, seed: u64) {
        self.shuffle(&mut GameRng::new(seed));
    }

    /// Remove and return the top `n` cards of the draw pile.
    ///
    /// All or nothing: if fewer than `n` cards remain, nothing is removed.
    pub fn deal(&mut self, n: usize) -> Result<Dealt, GameError> {
        if self.draw_pile.len() < n {
            return Err(GameError::EmptyDeck);
        }
        let mut dealt = Dealt::new();
        for _ in 0..n {
            match self.draw_pile.pop_back() {
                Some(card) => dealt.push(card),
                None => return Err(GameError::EmptyDeck),
            }
        }
        Ok(dealt)
    }

    /// Deal `n` cards, reshuffling the discard pile into the draw pile when
    /// the draw pile runs out.
    ///
    /// Returns fewer than `n` cards only when every card outside the hands
    /// (except the top card) has already been dealt.
    pub fn deal_recovering(&mut self, n: usize, rng: &mut GameRng) -> Dealt {
        match self.deal(n) {
            Ok(dealt) => dealt,
            Err(GameError::EmptyDeck) => {
                let moved = self.reshuffle(rng);
                debug!(moved, "draw pile exhausted, reshuffled discards");
                let available = n.min(self.draw_pile.len());
                if available < n {
                    warn!(requested = n, available, "not enough cards in circulation to deal");
                }
                self.deal(available).unwrap_or_default()
            }
            Err(_) => Dealt::new(),
        }
    }

    /// Move every discard except the top card under the draw pile and
    /// shuffle the draw pile. Returns the number of cards moved.
    pub fn reshuffle(&mut self, rng: &mut GameRng) -> usize {
        let top = self.discard_pile.pop_back();
        let moved = self.discard_pile.len();

        let mut cards: Vec<Card> = self.discard_pile.iter().copied().collect();
        cards.extend(self.draw_pile.iter().copied());
        rng.shuffle(&mut cards);

        self.draw_pile = cards.into_iter().collect();
        self.discard_pile = top.into_iter().collect();
        moved
    }

    /// Put a card on top of the discard pile. It becomes the top card.
    pub fn discard(&mut self, card: Card) {
        self.discard_pile.push_back(card);
    }

    /// Current top of the discard pile.
    #[must_use]
    pub fn top_card(&self) -> Option<&Card> {
        self.discard_pile.last()
    }

    #[must_use]
    pub fn draw_count(&self) -> usize {
        self.draw_pile.len()
    }

    #[must_use]
    pub fn discard_count(&self) -> usize {
        self.discard_pile.len()
    }

    /// Cards held by the deck (both piles).
    #[must_use]
    pub fn len(&self) -> usize {
        self.draw_pile.len() + self.discard_pile.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate over every card in both piles.
    pub fn iter(&self) -> impl Iterator<Item = &Card> {
        self.draw_pile.iter().chain(self.discard_pile.iter())
    }
}
