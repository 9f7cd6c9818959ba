//! Card model.
//!
//! Cards are small `Copy` values. Fields are private so a card cannot be
//! altered after the deck is built; the session moves cards between hands
//! and piles but never edits them.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Unique identifier of a card within one session's deck.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardId(pub u32);

impl CardId {
    /// Create a new card ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for CardId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "card-{}", self.0)
    }
}

/// What a card does when played.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardKind {
    /// Move forward by the card's value.
    Hop,
    /// Pass over the next player.
    Skip,
    /// Flip turn direction.
    Reverse,
    /// Make a player lose their next turn.
    Block,
    /// Double the player's next hop.
    Double,
    /// Re-declare the color (and optionally value) to match against.
    Wild,
    /// Win outright once close enough to the threshold.
    Finish,
}

impl CardKind {
    /// Every kind except hop alters turn order or status instead of position.
    #[must_use]
    pub const fn is_action(self) -> bool {
        !matches!(self, CardKind::Hop)
    }

    /// Lowercase protocol name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            CardKind::Hop => "hop",
            CardKind::Skip => "skip",
            CardKind::Reverse => "reverse",
            CardKind::Block => "block",
            CardKind::Double => "double",
            CardKind::Wild => "wild",
            CardKind::Finish => "finish",
        }
    }
}

/// Card color. `Any` marks cards that are not bound to a color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Red,
    Blue,
    Green,
    Yellow,
    Any,
}

impl Color {
    /// The four concrete colors of the palette.
    pub const PALETTE: [Color; 4] = [Color::Red, Color::Blue, Color::Green, Color::Yellow];

    /// Lowercase protocol name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Color::Red => "red",
            Color::Blue => "blue",
            Color::Green => "green",
            Color::Yellow => "yellow",
            Color::Any => "any",
        }
    }
}

impl FromStr for Color {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "red" => Ok(Color::Red),
            "blue" => Ok(Color::Blue),
            "green" => Ok(Color::Green),
            "yellow" => Ok(Color::Yellow),
            "any" | "wild" => Ok(Color::Any),
            other => Err(format!("unknown color '{other}'")),
        }
    }
}

/// A single card.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Card {
    id: CardId,
    kind: CardKind,
    color: Color,
    value: u32,
}

impl Card {
    /// Create a hop card.
    #[must_use]
    pub const fn hop(id: CardId, color: Color, value: u32) -> Self {
        Self {
            id,
            kind: CardKind::Hop,
            color,
            value,
        }
    }

    /// Create a colorless action card with value 0.
    ///
    /// Use [`Card::finish`] for finish cards, which carry a value.
    #[must_use]
    pub const fn action(id: CardId, kind: CardKind) -> Self {
        Self {
            id,
            kind,
            color: Color::Any,
            value: 0,
        }
    }

    /// Create a finish card reaching `reach` spaces.
    #[must_use]
    pub const fn finish(id: CardId, reach: u32) -> Self {
        Self {
            id,
            kind: CardKind::Finish,
            color: Color::Any,
            value: reach,
        }
    }

    #[must_use]
    pub const fn id(&self) -> CardId {
        self.id
    }

    #[must_use]
    pub const fn kind(&self) -> CardKind {
        self.kind
    }

    #[must_use]
    pub const fn color(&self) -> Color {
        self.color
    }

    /// Movement for hop cards, reach for finish cards, 0 otherwise.
    #[must_use]
    pub const fn value(&self) -> u32 {
        self.value
    }

    #[must_use]
    pub const fn is_hop(&self) -> bool {
        matches!(self.kind, CardKind::Hop)
    }
}

impl std::fmt::Display for Card {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            CardKind::Hop => write!(f, "{} {}", self.color.name(), self.value),
            CardKind::Finish => write!(f, "finish {}", self.value),
            kind => f.write_str(kind.name()),
        }
    }
}

/// Build the 52-card standard deck in a fixed order.
///
/// - hop 1..=10 in each palette color (40)
/// - skip, reverse, block, double: two each (8)
/// - wild: two
/// - finish: two, valued `finish_reach`
///
/// Ids are assigned sequentially from 0.
#[must_use]
pub fn standard_deck(finish_reach: u32) -> Vec<Card> {
    let mut next = 0u32;
    let mut id = || {
        let current = CardId::new(next);
        next += 1;
        current
    };

    let mut deck = Vec::with_capacity(52);

    for color in Color::PALETTE {
        for value in 1..=10 {
            deck.push(Card::hop(id(), color, value));
        }
    }

    for kind in [CardKind::Skip, CardKind::Reverse, CardKind::Block, CardKind::Double] {
        for _ in 0..2 {
            deck.push(Card::action(id(), kind));
        }
    }

    for _ in 0..2 {
        deck.push(Card::action(id(), CardKind::Wild));
    }

    for _ in 0..2 {
        deck.push(Card::finish(id(), finish_reach));
    }

    deck
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_standard_deck_composition() {
        let deck = standard_deck(5);
        assert_eq!(deck.len(), 52);

        let hops = deck.iter().filter(|c| c.is_hop()).count();
        assert_eq!(hops, 40);

        for kind in [CardKind::Skip, CardKind::Reverse, CardKind::Block, CardKind::Double, CardKind::Wild, CardKind::Finish] {
            assert_eq!(deck.iter().filter(|c| c.kind() == kind).count(), 2, "{kind:?}");
        }

        let finish = deck.iter().find(|c| c.kind() == CardKind::Finish).unwrap();
        assert_eq!(finish.value(), 5);
    }

    #[test]
    fn test_standard_deck_ids_unique() {
        let deck = standard_deck(5);
        let ids: HashSet<_> = deck.iter().map(Card::id).collect();
        assert_eq!(ids.len(), deck.len());
    }

    #[test]
    fn test_action_cards_are_colorless() {
        for card in standard_deck(5).iter().filter(|c| c.kind().is_action()) {
            assert_eq!(card.color(), Color::Any);
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(Card::hop(CardId::new(0), Color::Red, 3).to_string(), "red 3");
        assert_eq!(Card::action(CardId::new(1), CardKind::Skip).to_string(), "skip");
        assert_eq!(Card::finish(CardId::new(2), 5).to_string(), "finish 5");
    }

    #[test]
    fn test_color_parse() {
        assert_eq!("RED".parse::<Color>(), Ok(Color::Red));
        assert_eq!("any".parse::<Color>(), Ok(Color::Any));
        assert!("purple".parse::<Color>().is_err());
    }

    #[test]
    fn test_card_json_shape() {
        let json = serde_json::to_value(Card::hop(CardId::new(4), Color::Blue, 7)).unwrap();
        assert_eq!(json["id"], 4);
        assert_eq!(json["kind"], "hop");
        assert_eq!(json["color"], "blue");
        assert_eq!(json["value"], 7);
    }
}
