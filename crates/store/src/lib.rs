//! Brisca store: the action log, its cursor and the projections rebuilt from it.

#![forbid(unsafe_code)]

pub mod cache;
pub mod inject;
pub mod pacing;
pub mod projection;
pub mod reconciler;
pub mod reducer;

pub use cache::ActionCache;
pub use inject::{inject, Injected};
pub use pacing::{PaceContext, PacingPolicy, TimerConfig};
pub use projection::{
    BoardPosition, GameSettings, PlayerState, Projections, StatusState, TableState, TimerPhase, TurnTimer,
};
pub use reconciler::{Claim, Reconciler};
pub use reducer::{apply, Applied, ReduceError};
