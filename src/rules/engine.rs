//! Play validation and effect resolution.
//!
//! Resolution is split from application: `RulesEngine::resolve` inspects
//! the session without touching it and returns a `ResolvedPlay`. Only a
//! fully validated play is handed to the session for application, so an
//! illegal play never leaves partial effects behind.
//!
//! ## Matching
//!
//! The discard top is reduced to a `MatchTarget` (a color and optionally a
//! value). Wild and action cards match any target. A hop card matches when
//! the target color is `any`, equals the hop's color, or the target value
//! equals the hop's value.

use serde::Serialize;

use crate::cards::{Card, CardKind, Color};
use crate::core::{GameConfig, GameError, PlayerId};
use crate::players::{Player, PlayerRegistry};
use crate::turns::TurnEngine;

/// Highest value a wild may declare.
pub const MAX_WILD_VALUE: u32 = 10;

/// Color and value declared by a wild card.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct WildBias {
    pub color: Color,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<u32>,
}

/// What the next card has to match.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MatchTarget {
    pub color: Color,
    /// Only a wild declares a value; hop tops match on color alone.
    pub value: Option<u32>,
}

impl MatchTarget {
    /// Matches anything. Used before the first card is turned up.
    pub const OPEN: MatchTarget = MatchTarget {
        color: Color::Any,
        value: None,
    };

    /// Reduce a discard top (and the bias declared on it, if it is a wild).
    #[must_use]
    pub fn from_top(top: Option<&Card>, bias: Option<WildBias>) -> Self {
        match top {
            None => Self::OPEN,
            Some(card) => match card.kind() {
                CardKind::Hop => MatchTarget {
                    color: card.color(),
                    value: None,
                },
                CardKind::Wild => bias.map_or(Self::OPEN, |b| MatchTarget {
                    color: b.color,
                    value: b.value,
                }),
                _ => Self::OPEN,
            },
        }
    }
}

/// Arguments of a PLAY command.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PlayRequest {
    /// 0-based index into the player's own hand.
    pub card_index: usize,
    /// Declared color (wild only).
    pub color: Option<Color>,
    /// Declared value (wild only).
    pub value: Option<u32>,
    /// Block target (block only). Defaults to the next player.
    pub target: Option<PlayerId>,
}

impl PlayRequest {
    /// Play the card at `card_index` without arguments.
    #[must_use]
    pub fn card(card_index: usize) -> Self {
        Self {
            card_index,
            ..Self::default()
        }
    }
}

/// Effect of a validated play.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "effect", rename_all = "lowercase")]
pub enum Effect {
    /// Move forward; `doubled` when a double was consumed.
    Hop { spaces: u32, doubled: bool },
    Skip,
    Reverse,
    Block { target: PlayerId },
    Double,
    Wild { bias: WildBias },
    Finish,
}

/// A play that passed validation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedPlay {
    pub player: PlayerId,
    pub card_index: usize,
    pub card: Card,
    #[serde(flatten)]
    pub effect: Effect,
}

/// How a game was won.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WinReason {
    /// Reached the threshold with a hop.
    Reached,
    /// Played a finish card.
    Finish,
    /// Every other player disconnected.
    Forfeit,
}

/// Result of a completed game.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameResult {
    /// Single winner.
    Winner { player: PlayerId, reason: WinReason },
    /// Everyone left; nobody won.
    NoWinner,
}

impl GameResult {
    /// Check if a player won.
    #[must_use]
    pub fn is_winner(&self, player: PlayerId) -> bool {
        matches!(self, GameResult::Winner { player: p, .. } if *p == player)
    }

    #[must_use]
    pub fn winner(&self) -> Option<PlayerId> {
        match self {
            GameResult::Winner { player, .. } => Some(*player),
            GameResult::NoWinner => None,
        }
    }
}

/// Read-only view of the session the rules decide against.
#[derive(Clone, Copy)]
pub struct RuleContext<'a> {
    pub players: &'a PlayerRegistry,
    pub turns: &'a TurnEngine,
    pub top: MatchTarget,
}

/// Rules engine trait.
///
/// The session calls into the rules but never interprets card kinds
/// itself beyond applying the returned `Effect`.
pub trait RulesEngine {
    /// Get the rule configuration.
    fn config(&self) -> &GameConfig;

    /// Can `card` be played on `top` by `player`, ignoring turn order?
    fn matches(&self, card: &Card, top: &MatchTarget, player: &Player) -> bool;

    /// Validate a play and compute its effect without mutating anything.
    fn resolve(&self, ctx: &RuleContext<'_>, player: PlayerId, request: &PlayRequest) -> Result<ResolvedPlay, GameError>;

    /// First seat at or past the win threshold.
    fn winner(&self, players: &PlayerRegistry) -> Option<PlayerId> {
        let threshold = self.config().win_threshold;
        players
            .iter()
            .find(|p| p.is_active() && p.position() >= threshold)
            .map(Player::id)
    }

    /// Hand indices `player` could legally play right now.
    ///
    /// Empty when it is not the player's turn.
    fn playable_indices(&self, ctx: &RuleContext<'_>, player: PlayerId) -> Vec<usize> {
        if ctx.turns.current() != player {
            return Vec::new();
        }
        let Ok(p) = ctx.players.get(player) else {
            return Vec::new();
        };
        p.hand()
            .iter()
            .enumerate()
            .filter(|(_, card)| self.matches(card, &ctx.top, p))
            .map(|(i, _)| i)
            .collect()
    }
}

/// The BunnyHop rule set.
#[derive(Clone, Debug, Default)]
pub struct BunnyHopRules {
    config: GameConfig,
}

impl BunnyHopRules {
    #[must_use]
    pub fn new(config: GameConfig) -> Self {
        Self { config }
    }

    fn finish_reaches(&self, player: &Player, card: &Card) -> bool {
        player.position().saturating_add(card.value()) >= self.config.win_threshold
    }

    fn block_target(&self, ctx: &RuleContext<'_>, player: PlayerId, requested: Option<PlayerId>) -> Result<PlayerId, GameError> {
        match requested {
            Some(target) if target == player => Err(GameError::invalid("cannot block yourself")),
            Some(target) if !ctx.players.is_active(target) => {
                Err(GameError::invalid(format!("player {target} cannot be blocked")))
            }
            Some(target) => Ok(target),
            None => ctx
                .turns
                .next_after(player, ctx.players)
                .filter(|&next| next != player)
                .ok_or_else(|| GameError::invalid("nobody to block")),
        }
    }
}

impl RulesEngine for BunnyHopRules {
    fn config(&self) -> &GameConfig {
        &self.config
    }

    fn matches(&self, card: &Card, top: &MatchTarget, player: &Player) -> bool {
        match card.kind() {
            CardKind::Hop => {
                top.color == Color::Any || top.color == card.color() || top.value == Some(card.value())
            }
            CardKind::Finish => self.finish_reaches(player, card),
            _ => true,
        }
    }

    fn resolve(&self, ctx: &RuleContext<'_>, player: PlayerId, request: &PlayRequest) -> Result<ResolvedPlay, GameError> {
        let current = ctx.turns.current();
        if current != player {
            return Err(GameError::NotYourTurn { current });
        }

        let actor = ctx.players.get(player)?;
        let card = *actor.hand().get(request.card_index).ok_or_else(|| {
            GameError::invalid(format!(
                "no card at index {} (hand has {})",
                request.card_index,
                actor.hand().len()
            ))
        })?;

        let kind = card.kind();
        if kind != CardKind::Wild && (request.color.is_some() || request.value.is_some()) {
            return Err(GameError::invalid(format!("{} takes no color or value", kind.name())));
        }
        if kind != CardKind::Block && request.target.is_some() {
            return Err(GameError::invalid(format!("{} takes no target", kind.name())));
        }

        if !self.matches(&card, &ctx.top, actor) {
            return Err(match kind {
                CardKind::Finish => GameError::invalid(format!(
                    "finish needs position {} or more",
                    self.config.win_threshold.saturating_sub(card.value())
                )),
                _ => GameError::invalid(format!("{card} does not match the top card")),
            });
        }

        let effect = match kind {
            CardKind::Hop => {
                let doubled = actor.has_double();
                let spaces = if doubled { card.value() * 2 } else { card.value() };
                Effect::Hop { spaces, doubled }
            }
            CardKind::Skip => Effect::Skip,
            CardKind::Reverse => Effect::Reverse,
            CardKind::Block => Effect::Block {
                target: self.block_target(ctx, player, request.target)?,
            },
            CardKind::Double => Effect::Double,
            CardKind::Wild => {
                if let Some(value) = request.value {
                    if !(1..=MAX_WILD_VALUE).contains(&value) {
                        return Err(GameError::invalid(format!(
                            "wild value must be 1..={MAX_WILD_VALUE}"
                        )));
                    }
                }
                Effect::Wild {
                    bias: WildBias {
                        color: request.color.unwrap_or(Color::Any),
                        value: request.value,
                    },
                }
            }
            CardKind::Finish => Effect::Finish,
        };

        Ok(ResolvedPlay {
            player,
            card_index: request.card_index,
            card,
            effect,
        })
    }
}
