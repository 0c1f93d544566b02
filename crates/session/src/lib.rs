//! Brisca session: drives the reconciler from a live or replayed action source.
//!
//! One task per session owns every piece of mutable state. Readers get immutable
//! snapshots through [`SessionHandle::current`] and a bumped epoch on every change.

#![forbid(unsafe_code)]

pub mod config;
pub mod engine;
pub mod hand;
pub mod source;

pub use config::SessionConfig;
pub use engine::{
    spawn_live, spawn_replay, spawn_replay_log, Command, Mode, SessionCommands, SessionError, SessionHandle,
    SessionOutcome, SessionSnapshot,
};
pub use hand::{HandState, PlayError};
pub use source::{spawn_pump, ActionSource, LiveSource, ReplaySource, SourceBatch};
