//! Where actions come from: the live feed or a finished game's log.

use std::sync::Arc;
use std::time::{Duration, Instant};

use brisca_api::{ApiResult, GameApi};
use brisca_core::Action;
use brisca_store::inject;
use metrics::{counter, histogram};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval, Interval, MissedTickBehavior};
use tracing::{debug, info};
use uuid::Uuid;

/// One batch of new actions, pacing markers already inserted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceBatch {
    pub actions: Vec<Action>,
    /// The batch contains a `GameWon`.
    pub terminal: bool,
    /// The server reports the game as over.
    pub game_over: bool,
}

#[async_trait::async_trait]
pub trait ActionSource: Send {
    /// Next batch, or `None` once the source is exhausted.
    async fn next_batch(&mut self) -> Option<SourceBatch>;
}

/// Polls the server on a fixed interval. A failed fetch is an empty batch.
pub struct LiveSource {
    api: Arc<dyn GameApi>,
    ticker: Interval,
    game_over: bool,
    terminal_seen: bool,
    last_cycle: bool,
    done: bool,
}

impl LiveSource {
    pub fn new(api: Arc<dyn GameApi>, poll_interval: Duration) -> Self {
        let mut ticker = interval(poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { api, ticker, game_over: false, terminal_seen: false, last_cycle: false, done: false }
    }
}

async fn fetch_actions(api: &dyn GameApi) -> Vec<Action> {
    let t0 = Instant::now();
    let res = api.actions().await;
    histogram!("brisca_poll_ms", t0.elapsed().as_secs_f64() * 1000.0);
    match res {
        Ok(actions) => actions,
        Err(e) => {
            counter!("brisca_poll_failures_total", 1u64, "endpoint" => "actions");
            debug!(error = %e, "action poll failed; retrying next tick");
            Vec::new()
        }
    }
}

#[async_trait::async_trait]
impl ActionSource for LiveSource {
    async fn next_batch(&mut self) -> Option<SourceBatch> {
        if self.done {
            return None;
        }
        self.ticker.tick().await;
        let batch = inject(fetch_actions(self.api.as_ref()).await);
        match self.api.game_over().await {
            Ok(over) => self.game_over = over,
            Err(e) => {
                counter!("brisca_poll_failures_total", 1u64, "endpoint" => "gameover");
                debug!(error = %e, "game over poll failed; keeping last value");
            }
        }
        self.terminal_seen |= batch.terminal;
        if self.terminal_seen && self.game_over {
            // One full cycle past the terminal action, then stop.
            if self.last_cycle {
                info!("game over; live polling stopped");
                self.done = true;
            }
            self.last_cycle = true;
        }
        Some(SourceBatch { actions: batch.actions, terminal: batch.terminal, game_over: self.game_over })
    }
}

/// A complete historical log delivered as one batch.
pub struct ReplaySource {
    log: Option<Vec<Action>>,
}

impl ReplaySource {
    pub fn new(log: Vec<Action>) -> Self { Self { log: Some(log) } }

    pub async fn fetch(api: &dyn GameApi, game_id: Uuid) -> ApiResult<Self> {
        let log = api.replay(game_id).await?;
        info!(%game_id, count = log.len(), "replay log fetched");
        Ok(Self::new(log))
    }
}

#[async_trait::async_trait]
impl ActionSource for ReplaySource {
    async fn next_batch(&mut self) -> Option<SourceBatch> {
        let log = self.log.take()?;
        let batch = inject(log);
        Some(SourceBatch { actions: batch.actions, terminal: batch.terminal, game_over: true })
    }
}

/// Forward batches from `source` until it is exhausted or the receiver is gone.
pub fn spawn_pump(mut source: Box<dyn ActionSource>, tx: mpsc::Sender<SourceBatch>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(batch) = source.next_batch().await {
            if tx.send(batch).await.is_err() {
                debug!("session gone; source pump exiting");
                return;
            }
        }
        debug!("source exhausted");
    })
}
