//! Rules engine for BunnyHop.
//!
//! `RulesEngine` decides whether a play is legal and what it does:
//! - Matching a card against the discard top
//! - Computing the effect of each card kind
//! - Win detection
//!
//! The session applies the returned effects; the rules never mutate state.

pub mod engine;

pub use engine::{
    BunnyHopRules, Effect, GameResult, MatchTarget, PlayRequest, ResolvedPlay, RuleContext, RulesEngine,
    WildBias, WinReason, MAX_WILD_VALUE,
};
