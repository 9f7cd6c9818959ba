//! Line-oriented text protocol.
//!
//! Requests are whitespace-separated command lines; responses and pushed
//! updates are single-line JSON objects tagged by `type`.

pub mod command;
pub mod dispatcher;
pub mod response;

pub use command::Command;
pub use dispatcher::{ClientContext, Dispatcher};
pub use response::{Outcome, Response};
