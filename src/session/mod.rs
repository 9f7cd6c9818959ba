//! Game sessions: the state machine, its snapshots and the live registry.

pub mod registry;
pub mod snapshot;
pub mod state;

pub use registry::{SessionHandle, SessionRegistry, DEFAULT_BROADCAST_CAPACITY};
pub use snapshot::{ClientView, PlayerView, SessionSnapshot};
pub use state::{DrawOutcome, GameId, PlayOutcome, PlayRecord, Session, SessionBuilder, SessionState};
