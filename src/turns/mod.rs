//! Turn engine: who acts next, in which direction, and who is passed over.

pub mod engine;

pub use engine::{Direction, ReverseOutcome, TurnChange, TurnEngine};
