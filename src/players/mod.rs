//! Player registry: seats, hands, positions and status flags.
//!
//! Status flags (`is_blocked`, `has_double`) are set by the rules and
//! cleared by the turn engine or the rules when consumed.

pub mod registry;

pub use registry::{Hand, Player, PlayerRegistry, SEAT_LIMIT};
