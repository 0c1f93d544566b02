//! The session task: one loop that owns the reconciler, the hand and the pacing timer.

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use brisca_api::{ApiError, GameApi};
use brisca_core::{Action, Card};
use brisca_store::{Injected, Projections, Reconciler};
use metrics::counter;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::SessionConfig;
use crate::hand::{HandState, PlayError};
use crate::source::{spawn_pump, ActionSource, LiveSource, ReplaySource, SourceBatch};

const CHANNEL_CAP: usize = 64;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Play(#[from] PlayError),
    #[error("the bottom card cannot be swapped now")]
    CannotSwap,
    #[error("not available while replaying")]
    ReplayMode,
    #[error("api: {0}")]
    Api(#[from] ApiError),
    #[error("session has ended")]
    Closed,
    #[error("session task failed: {0}")]
    Task(String),
}

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Live,
    Replay,
}

/// What a renderer needs, published after every change.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SessionSnapshot {
    pub epoch: u64,
    pub mode: Mode,
    pub projections: Projections,
    pub hand: Vec<Card>,
    /// The hand includes an unconfirmed play.
    pub speculative: bool,
    pub my_seat: Option<usize>,
    pub processing: i64,
    pub processed: i64,
    pub log_len: usize,
    /// The game has been decided.
    pub terminal: bool,
    /// The session loop has stopped.
    pub finished: bool,
    /// When the current turn timer was restarted.
    #[serde(skip)]
    pub timer_started: Option<std::time::Instant>,
}

impl SessionSnapshot {
    /// Seconds left on the turn timer, if one is running.
    pub fn timer_remaining(&self) -> Option<Duration> {
        let started = self.timer_started?;
        Some(self.projections.status.timer.length.saturating_sub(started.elapsed()))
    }
}

/// Final state plus the action log as seen by the session.
#[derive(Debug, Clone)]
pub struct SessionOutcome {
    pub snapshot: Arc<SessionSnapshot>,
    pub log: Vec<Action>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    PlayCard(usize),
    SwapBottomCard,
    Leave,
}

struct Envelope {
    cmd: Command,
    reply: oneshot::Sender<Result<(), SessionError>>,
}

/// Cloneable command side of a session.
#[derive(Clone)]
pub struct SessionCommands {
    tx: mpsc::Sender<Envelope>,
}

impl SessionCommands {
    pub async fn send(&self, cmd: Command) -> Result<(), SessionError> {
        let (reply, rx) = oneshot::channel();
        self.tx.send(Envelope { cmd, reply }).await.map_err(|_| SessionError::Closed)?;
        rx.await.map_err(|_| SessionError::Closed)?
    }

    /// `index` is zero based.
    pub async fn play_card(&self, index: usize) -> Result<(), SessionError> { self.send(Command::PlayCard(index)).await }
    pub async fn swap_bottom_card(&self) -> Result<(), SessionError> { self.send(Command::SwapBottomCard).await }
    pub async fn leave(&self) -> Result<(), SessionError> { self.send(Command::Leave).await }
}

/// Handle for readers and commands. The session stops once this handle and every
/// [`SessionCommands`] clone are gone.
pub struct SessionHandle {
    snap: Arc<ArcSwap<SessionSnapshot>>,
    epoch_rx: watch::Receiver<u64>,
    commands: SessionCommands,
    task: JoinHandle<SessionOutcome>,
}

impl SessionHandle {
    pub fn current(&self) -> Arc<SessionSnapshot> { self.snap.load_full() }
    pub fn subscribe_epoch(&self) -> watch::Receiver<u64> { self.epoch_rx.clone() }
    pub fn commands(&self) -> SessionCommands { self.commands.clone() }

    pub async fn play_card(&self, index: usize) -> Result<(), SessionError> { self.commands.play_card(index).await }
    pub async fn swap_bottom_card(&self) -> Result<(), SessionError> { self.commands.swap_bottom_card().await }
    pub async fn leave(&self) -> Result<(), SessionError> { self.commands.leave().await }

    /// Wait for the session loop to stop.
    pub async fn join(self) -> Result<SessionOutcome, SessionError> {
        // Keep the command sender alive so waiting does not count as abandoning.
        let SessionHandle { task, commands, .. } = self;
        let out = task.await.map_err(|e| SessionError::Task(e.to_string()));
        drop(commands);
        out
    }
}

/// Play a game against the server.
pub fn spawn_live(api: Arc<dyn GameApi>, config: SessionConfig) -> SessionHandle {
    let source = LiveSource::new(Arc::clone(&api), config.poll_interval);
    spawn(Some(api), Mode::Live, Box::new(source), config)
}

/// Replay a finished game fetched from the server.
pub async fn spawn_replay(
    api: Arc<dyn GameApi>,
    game_id: Uuid,
    config: SessionConfig,
) -> Result<SessionHandle, SessionError> {
    let source = ReplaySource::fetch(api.as_ref(), game_id).await?;
    Ok(spawn(None, Mode::Replay, Box::new(source), config))
}

/// Replay a log already in memory, e.g. one recorded earlier.
pub fn spawn_replay_log(actions: Vec<Action>, config: SessionConfig) -> SessionHandle {
    spawn(None, Mode::Replay, Box::new(ReplaySource::new(actions)), config)
}

fn spawn(api: Option<Arc<dyn GameApi>>, mode: Mode, source: Box<dyn ActionSource>, config: SessionConfig) -> SessionHandle {
    let snap = Arc::new(ArcSwap::from_pointee(SessionSnapshot { mode, ..SessionSnapshot::default() }));
    let (epoch_tx, epoch_rx) = watch::channel(0u64);
    let (cmd_tx, cmd_rx) = mpsc::channel(CHANNEL_CAP);
    let (batch_tx, batch_rx) = mpsc::channel(CHANNEL_CAP);
    let pump = spawn_pump(source, batch_tx);

    let engine = Engine {
        api,
        mode,
        rec: Reconciler::new(None, config.pacing, config.timers),
        hand: HandState::default(),
        epoch: 0,
        snap: Arc::clone(&snap),
        epoch_tx,
        timer_started: None,
        last_restarts: 0,
        exhausted: false,
        left: false,
    };
    let task = tokio::spawn(engine.run(batch_rx, cmd_rx, pump));
    SessionHandle { snap, epoch_rx, commands: SessionCommands { tx: cmd_tx }, task }
}

struct Engine {
    /// `None` when replaying; nothing is sent to the server then.
    api: Option<Arc<dyn GameApi>>,
    mode: Mode,
    rec: Reconciler,
    hand: HandState,
    epoch: u64,
    snap: Arc<ArcSwap<SessionSnapshot>>,
    epoch_tx: watch::Sender<u64>,
    timer_started: Option<std::time::Instant>,
    last_restarts: u64,
    exhausted: bool,
    left: bool,
}

impl Engine {
    async fn run(
        mut self,
        mut batches: mpsc::Receiver<SourceBatch>,
        mut cmds: mpsc::Receiver<Envelope>,
        pump: JoinHandle<()>,
    ) -> SessionOutcome {
        info!(mode = ?self.mode, "session started");
        self.bootstrap().await;
        self.publish(false);

        let pace = tokio::time::sleep(Duration::ZERO);
        tokio::pin!(pace);
        let mut armed = false;

        loop {
            if !armed {
                if let Some(claim) = self.rec.claim_next() {
                    debug!(
                        index = self.rec.cache().processing(),
                        kind = claim.action.kind().wire_name(),
                        delay_ms = claim.delay.as_millis() as u64,
                        "action claimed"
                    );
                    pace.as_mut().reset(tokio::time::Instant::now() + claim.delay);
                    armed = true;
                }
            }
            if self.is_done(armed) {
                break;
            }
            tokio::select! {
                () = &mut pace, if armed => {
                    armed = false;
                    self.apply_claimed().await;
                }
                maybe = batches.recv(), if !self.exhausted => match maybe {
                    Some(batch) => self.ingest(batch),
                    None => {
                        debug!("action source exhausted");
                        self.exhausted = true;
                    }
                },
                maybe = cmds.recv() => match maybe {
                    Some(env) => {
                        let result = self.handle(env.cmd).await;
                        let _ = env.reply.send(result);
                    }
                    None => {
                        info!("every session handle dropped; stopping");
                        break;
                    }
                },
            }
        }

        pump.abort();
        let snapshot = self.publish(true);
        info!(
            processed = self.rec.cache().processed(),
            terminal = self.rec.is_finished(),
            left = self.left,
            "session stopped"
        );
        SessionOutcome { snapshot, log: self.rec.cache().log().to_vec() }
    }

    fn is_done(&self, armed: bool) -> bool {
        self.left || self.rec.is_finished() || (self.exhausted && !armed && self.rec.cache().is_drained())
    }

    async fn bootstrap(&mut self) {
        let Some(api) = self.api.clone() else { return };
        match api.my_seat().await {
            Ok(seat) => {
                info!(seat, "seat assigned");
                self.rec.projections_mut().set_my_seat(Some(seat));
            }
            Err(e) => warn!(error = %e, "could not fetch own seat; watching as a spectator"),
        }
        self.refresh_hand().await;
    }

    fn ingest(&mut self, batch: SourceBatch) {
        let grew = !batch.actions.is_empty();
        let over_changed = batch.game_over != self.rec.game_over();
        self.rec.set_game_over(batch.game_over);
        self.rec.ingest(Injected { actions: batch.actions, terminal: batch.terminal });
        if grew || over_changed {
            self.publish(false);
        }
    }

    async fn apply_claimed(&mut self) {
        let Some(applied) = self.rec.complete() else { return };
        if applied.hand_affecting {
            self.refresh_hand().await;
        }
        self.sync_derived();
        self.publish(false);
    }

    /// Fetch the hand from the server. Failures keep the current hand.
    async fn refresh_hand(&mut self) {
        let Some(api) = self.api.clone() else { return };
        match api.hand().await {
            Ok(cards) => self.hand.replace(cards),
            Err(e) => warn!(error = %e, "hand refresh failed; keeping current hand"),
        }
    }

    fn sync_derived(&mut self) {
        let can_swap = self.mode == Mode::Live && self.rec.projections().swap_candidate(self.hand.cards());
        let p = self.rec.projections_mut();
        p.status.can_swap = can_swap;
        let restarts = p.status.timer.restarts;
        if restarts != self.last_restarts {
            self.last_restarts = restarts;
            self.timer_started = Some(std::time::Instant::now());
        }
    }

    async fn handle(&mut self, cmd: Command) -> Result<(), SessionError> {
        debug!(?cmd, "command");
        if cmd == Command::Leave {
            if let Some(api) = &self.api {
                if let Err(e) = api.leave_game().await {
                    warn!(error = %e, "leave request failed");
                }
            }
            info!("left the game");
            self.left = true;
            return Ok(());
        }
        let api = self.api.clone().ok_or(SessionError::ReplayMode)?;
        match cmd {
            Command::PlayCard(index) => {
                self.hand.check_play(index, self.rec.projections())?;
                let card = self.hand.speculate_play(index);
                self.publish(false);
                match api.play_card(index).await {
                    Ok(()) => {
                        debug!(index, ?card, "play accepted");
                        self.hand.confirm();
                        self.publish(false);
                        Ok(())
                    }
                    Err(e) => {
                        counter!("brisca_speculative_rejected_total", 1u64);
                        warn!(index, error = %e, "play rejected; restoring hand");
                        self.hand.reject();
                        self.publish(false);
                        Err(e.into())
                    }
                }
            }
            Command::SwapBottomCard => {
                let p = self.rec.projections();
                if !(p.status.can_swap && p.is_my_turn()) {
                    return Err(SessionError::CannotSwap);
                }
                api.swap_bottom_card().await?;
                Ok(())
            }
            Command::Leave => Ok(()),
        }
    }

    fn publish(&mut self, finished: bool) -> Arc<SessionSnapshot> {
        self.epoch += 1;
        let p = self.rec.projections();
        let cache = self.rec.cache();
        let snap = Arc::new(SessionSnapshot {
            epoch: self.epoch,
            mode: self.mode,
            projections: p.clone(),
            hand: self.hand.cards().to_vec(),
            speculative: self.hand.is_pending(),
            my_seat: p.my_seat,
            processing: cache.processing(),
            processed: cache.processed(),
            log_len: cache.len(),
            terminal: self.rec.is_finished(),
            finished,
            timer_started: self.timer_started,
        });
        self.snap.store(Arc::clone(&snap));
        let _ = self.epoch_tx.send(self.epoch);
        snap
    }
}
