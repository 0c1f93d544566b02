//! Cache, reducer and pacing wired together for one game.

use std::time::Duration;

use brisca_core::{Action, ActionKind};
use metrics::counter;
use tracing::{debug, warn};

use crate::cache::ActionCache;
use crate::inject::Injected;
use crate::pacing::{PaceContext, PacingPolicy, TimerConfig};
use crate::projection::Projections;
use crate::reducer::{apply, Applied};

/// The action just claimed and how long to wait before applying it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claim {
    pub action: Action,
    pub delay: Duration,
}

/// Single consumer of the action log. Callers loop `claim_next`, wait out the
/// delay, then `complete`; the cursor guarantees one action in flight at a time.
#[derive(Debug)]
pub struct Reconciler {
    cache: ActionCache,
    projections: Projections,
    pacing: PacingPolicy,
    timers: TimerConfig,
    game_over: bool,
    terminal_seen: bool,
    finished: bool,
}

impl Reconciler {
    pub fn new(my_seat: Option<usize>, pacing: PacingPolicy, timers: TimerConfig) -> Self {
        Self {
            cache: ActionCache::new(),
            projections: Projections::new(my_seat),
            pacing,
            timers,
            game_over: false,
            terminal_seen: false,
            finished: false,
        }
    }

    pub fn projections(&self) -> &Projections { &self.projections }
    pub fn projections_mut(&mut self) -> &mut Projections { &mut self.projections }
    pub fn cache(&self) -> &ActionCache { &self.cache }
    pub fn pacing(&self) -> PacingPolicy { self.pacing }
    pub fn set_pacing(&mut self, pacing: PacingPolicy) { self.pacing = pacing; }
    pub fn set_game_over(&mut self, over: bool) { self.game_over = over; }
    pub fn game_over(&self) -> bool { self.game_over }
    /// A `GameWon` has been ingested, applied or not.
    pub fn terminal_seen(&self) -> bool { self.terminal_seen }
    /// A `GameWon` has been applied.
    pub fn is_finished(&self) -> bool { self.finished }

    pub fn ingest(&mut self, batch: Injected) {
        self.terminal_seen |= batch.terminal;
        if !batch.actions.is_empty() {
            debug!(count = batch.actions.len(), terminal = batch.terminal, "actions ingested");
        }
        self.cache.append(batch.actions);
    }

    /// Claim the next action, or `None` if one is in flight, the log is drained
    /// or the game has already ended.
    pub fn claim_next(&mut self) -> Option<Claim> {
        if self.finished {
            return None;
        }
        let ctx = self.pace_context();
        let action = self.cache.try_dispatch_next()?.clone();
        let delay = self.pacing.delay_for(&action, ctx);
        Some(Claim { action, delay })
    }

    /// Apply the claimed action and commit it. An action the reducer rejects is
    /// logged and committed anyway so the log keeps moving.
    pub fn complete(&mut self) -> Option<Applied> {
        let action = self.cache.claimed()?.clone();
        let kind = action.kind();
        let applied = match apply(&mut self.projections, &action, &self.timers) {
            Ok(applied) => {
                counter!("brisca_actions_applied_total", 1u64, "kind" => kind.wire_name());
                if kind == ActionKind::Undefined {
                    counter!("brisca_actions_undefined_total", 1u64);
                    debug!(index = self.cache.processing(), ?action, "undefined action skipped");
                }
                applied
            }
            Err(e) => {
                counter!("brisca_actions_skipped_total", 1u64, "kind" => kind.wire_name());
                warn!(index = self.cache.processing(), kind = kind.wire_name(), error = %e, "action rejected; skipping");
                Applied::default()
            }
        };
        self.finished |= applied.terminal;
        self.cache.commit();
        Some(applied)
    }

    /// Apply everything currently in the log without waiting. Returns how many
    /// actions were committed.
    pub fn run_to_end(&mut self) -> usize {
        let mut n = 0;
        while self.claim_next().is_some() {
            self.complete();
            n += 1;
        }
        n
    }

    fn pace_context(&self) -> PaceContext {
        PaceContext {
            my_seat: self.projections.my_seat,
            my_turn: self.projections.is_my_turn(),
            game_over: self.game_over,
        }
    }
}
