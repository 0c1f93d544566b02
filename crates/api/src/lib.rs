//! Brisca game API façade.
//!
//! The session engine talks to the server only through [`GameApi`]. [`HttpApi`]
//! is the real transport; [`MockApi`] is a scripted stand-in for tests.

#![forbid(unsafe_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use brisca_core::{Action, Card, CoreError};
use brisca_remote::{status_of, Remote, RemoteConfig};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

/// API errors. Every variant is recoverable from the session's point of view.
#[derive(Debug, Clone, thiserror::Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum ApiError {
    #[error("transport: {0}")]
    Transport(String),
    #[error("rejected: {0}")]
    Rejected(String),
    #[error("decode: {0}")]
    Decode(String),
    #[error("not_found: {0}")]
    NotFound(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Everything the client asks of the game server.
#[async_trait::async_trait]
pub trait GameApi: Send + Sync {
    /// Actions appended to the log since the previous call.
    async fn actions(&self) -> ApiResult<Vec<Action>>;

    async fn game_over(&self) -> ApiResult<bool>;

    /// The local player's hand as the server sees it.
    async fn hand(&self) -> ApiResult<Vec<Card>>;

    async fn my_seat(&self) -> ApiResult<usize>;

    async fn play_card(&self, index: usize) -> ApiResult<()>;

    async fn swap_bottom_card(&self) -> ApiResult<()>;

    async fn leave_game(&self) -> ApiResult<()>;

    /// Full action log of a finished game.
    async fn replay(&self, game_id: Uuid) -> ApiResult<Vec<Action>>;
}

// ----------------- HTTP implementation -----------------

pub struct HttpApi {
    remote: Remote,
}

impl HttpApi {
    pub fn new(cfg: &RemoteConfig) -> anyhow::Result<Self> { Ok(Self { remote: Remote::new(cfg)? }) }

    fn map_err(e: anyhow::Error) -> ApiError {
        let msg = format!("{e:#}");
        if status_of(&e).is_some() {
            ApiError::Rejected(msg)
        } else if e.chain().any(|c| c.is::<serde_json::Error>() || c.is::<CoreError>()) {
            ApiError::Decode(msg)
        } else {
            ApiError::Transport(msg)
        }
    }
}

#[async_trait::async_trait]
impl GameApi for HttpApi {
    async fn actions(&self) -> ApiResult<Vec<Action>> {
        let t0 = Instant::now();
        let actions = self.remote.actions().await.map_err(Self::map_err)?;
        debug!(count = actions.len(), took_ms = %t0.elapsed().as_millis(), "api: actions");
        Ok(actions)
    }

    async fn game_over(&self) -> ApiResult<bool> { self.remote.game_over().await.map_err(Self::map_err) }

    async fn hand(&self) -> ApiResult<Vec<Card>> { self.remote.hand().await.map_err(Self::map_err) }

    async fn my_seat(&self) -> ApiResult<usize> { self.remote.my_seat().await.map_err(Self::map_err) }

    async fn play_card(&self, index: usize) -> ApiResult<()> {
        debug!(index, "api: play card");
        self.remote.play_card(index).await.map_err(Self::map_err)
    }

    async fn swap_bottom_card(&self) -> ApiResult<()> { self.remote.swap_bottom_card().await.map_err(Self::map_err) }

    async fn leave_game(&self) -> ApiResult<()> { self.remote.leave_game().await.map_err(Self::map_err) }

    async fn replay(&self, game_id: Uuid) -> ApiResult<Vec<Action>> {
        let t0 = Instant::now();
        let log = self.remote.replay(&game_id).await.map_err(Self::map_err)?;
        debug!(%game_id, count = log.len(), took_ms = %t0.elapsed().as_millis(), "api: replay");
        Ok(log)
    }
}

// ----------------- Mock implementation -----------------

/// Commands the mock received, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    PlayCard(usize),
    SwapBottomCard,
    LeaveGame,
    Replay(Uuid),
}

#[derive(Default)]
struct MockState {
    batches: VecDeque<ApiResult<Vec<Action>>>,
    game_over: bool,
    hand: Vec<Card>,
    seat: usize,
    reject_plays: bool,
    reject_swaps: bool,
    replays: HashMap<Uuid, Vec<Action>>,
    calls: Vec<MockCall>,
    polls: usize,
    hand_fetches: usize,
}

/// Scripted server. `actions()` hands out queued batches one per call and then
/// empty ones; `game_over()` turns true once a batch with a `GameWon` was served.
#[derive(Default)]
pub struct MockApi {
    state: Mutex<MockState>,
}

impl MockApi {
    pub fn new() -> Self { Self::default() }

    fn state(&self) -> MutexGuard<'_, MockState> { self.state.lock().unwrap_or_else(PoisonError::into_inner) }

    pub fn with_seat(self, seat: usize) -> Self {
        self.state().seat = seat;
        self
    }

    pub fn with_hand(self, hand: Vec<Card>) -> Self {
        self.set_hand(hand);
        self
    }

    pub fn push_batch(&self, batch: Vec<Action>) { self.state().batches.push_back(Ok(batch)); }
    pub fn push_failure(&self) { self.state().batches.push_back(Err(ApiError::Transport("scripted failure".into()))); }
    pub fn set_hand(&self, hand: Vec<Card>) { self.state().hand = hand; }
    pub fn set_game_over(&self, over: bool) { self.state().game_over = over; }
    pub fn reject_plays(&self, reject: bool) { self.state().reject_plays = reject; }
    pub fn reject_swaps(&self, reject: bool) { self.state().reject_swaps = reject; }
    pub fn add_replay(&self, game_id: Uuid, log: Vec<Action>) { self.state().replays.insert(game_id, log); }

    pub fn calls(&self) -> Vec<MockCall> { self.state().calls.clone() }
    pub fn polls(&self) -> usize { self.state().polls }
    pub fn hand_fetches(&self) -> usize { self.state().hand_fetches }
    pub fn pending_batches(&self) -> usize { self.state().batches.len() }
}

#[async_trait::async_trait]
impl GameApi for MockApi {
    async fn actions(&self) -> ApiResult<Vec<Action>> {
        let mut st = self.state();
        st.polls += 1;
        let batch = st.batches.pop_front().unwrap_or_else(|| Ok(Vec::new()));
        if matches!(&batch, Ok(b) if b.iter().any(Action::is_terminal)) {
            st.game_over = true;
        }
        batch
    }

    async fn game_over(&self) -> ApiResult<bool> { Ok(self.state().game_over) }

    async fn hand(&self) -> ApiResult<Vec<Card>> {
        let mut st = self.state();
        st.hand_fetches += 1;
        Ok(st.hand.clone())
    }

    async fn my_seat(&self) -> ApiResult<usize> { Ok(self.state().seat) }

    async fn play_card(&self, index: usize) -> ApiResult<()> {
        let mut st = self.state();
        st.calls.push(MockCall::PlayCard(index));
        if st.reject_plays || index >= st.hand.len() {
            return Err(ApiError::Rejected(format!("cannot play card {index}")));
        }
        st.hand.remove(index);
        Ok(())
    }

    async fn swap_bottom_card(&self) -> ApiResult<()> {
        let mut st = self.state();
        st.calls.push(MockCall::SwapBottomCard);
        if st.reject_swaps {
            return Err(ApiError::Rejected("swap refused".into()));
        }
        Ok(())
    }

    async fn leave_game(&self) -> ApiResult<()> {
        self.state().calls.push(MockCall::LeaveGame);
        Ok(())
    }

    async fn replay(&self, game_id: Uuid) -> ApiResult<Vec<Action>> {
        let mut st = self.state();
        st.calls.push(MockCall::Replay(game_id));
        st.replays.get(&game_id).cloned().ok_or_else(|| ApiError::NotFound(format!("no game {game_id}")))
    }
}
