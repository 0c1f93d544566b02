//! Brisca remote: HTTP calls against the game server.

#![forbid(unsafe_code)]

use std::time::Duration;

use anyhow::{Context, Result};
use brisca_core::{decode_log, Action, Card};
use reqwest::header::{HeaderMap, HeaderValue, COOKIE};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;
use url::Url;
use uuid::Uuid;

pub const DEFAULT_URL: &str = "http://localhost:8000";

#[derive(Debug, Clone)]
pub struct RemoteConfig {
    pub base_url: Url,
    /// Applied to every request.
    pub timeout: Duration,
    /// Session cookie sent with every request, e.g. `session=abc`.
    pub cookie: Option<String>,
}

impl RemoteConfig {
    pub fn new(base_url: &str) -> Result<Self> {
        let mut base_url = Url::parse(base_url).with_context(|| format!("parsing server url {base_url:?}"))?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self { base_url, timeout: Duration::from_millis(2000), cookie: None })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_cookie(mut self, cookie: Option<String>) -> Self {
        self.cookie = cookie;
        self
    }
}

#[derive(Deserialize)]
struct SeatReply {
    seat: usize,
}

#[derive(Serialize)]
struct PlayCardBody {
    index: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReplayBody {
    game_id: String,
}

/// Thin client over the server endpoints. Non-2xx replies are errors.
#[derive(Debug, Clone)]
pub struct Remote {
    client: reqwest::Client,
    base: Url,
}

impl Remote {
    pub fn new(cfg: &RemoteConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if let Some(cookie) = &cfg.cookie {
            headers.insert(COOKIE, HeaderValue::from_str(cookie).context("session cookie is not a valid header value")?);
        }
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .default_headers(headers)
            .timeout(cfg.timeout)
            .build()
            .context("building http client")?;
        Ok(Self { client, base: cfg.base_url.clone() })
    }

    pub fn base(&self) -> &Url { &self.base }

    fn url(&self, path: &str) -> Result<Url> {
        self.base.join(path).with_context(|| format!("joining {path:?} onto {}", self.base))
    }

    async fn get_bytes(&self, path: &str) -> Result<Vec<u8>> {
        let url = self.url(path)?;
        let resp = self.client.get(url).send().await.with_context(|| format!("GET /{path}"))?;
        let resp = resp.error_for_status().with_context(|| format!("GET /{path}"))?;
        let body = resp.bytes().await.with_context(|| format!("reading /{path} body"))?;
        debug!(path, bytes = body.len(), "fetched");
        Ok(body.to_vec())
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let bytes = self.get_bytes(path).await?;
        serde_json::from_slice(&bytes).with_context(|| format!("decoding /{path}"))
    }

    async fn post<B: Serialize + ?Sized>(&self, path: &str, body: Option<&B>) -> Result<Vec<u8>> {
        let url = self.url(path)?;
        let mut req = self.client.post(url);
        if let Some(body) = body {
            req = req.json(body);
        }
        let resp = req.send().await.with_context(|| format!("POST /{path}"))?;
        let resp = resp.error_for_status().with_context(|| format!("POST /{path}"))?;
        let body = resp.bytes().await.with_context(|| format!("reading /{path} body"))?;
        Ok(body.to_vec())
    }

    /// Actions appended since the previous call.
    pub async fn actions(&self) -> Result<Vec<Action>> {
        let bytes = self.get_bytes("actions").await?;
        decode_log(&bytes).context("decoding /actions")
    }

    pub async fn game_over(&self) -> Result<bool> { self.get_json("gameover").await }

    pub async fn hand(&self) -> Result<Vec<Card>> { self.get_json("hand").await }

    pub async fn my_seat(&self) -> Result<usize> {
        let reply: SeatReply = self.get_json("myseat").await?;
        Ok(reply.seat)
    }

    pub async fn play_card(&self, index: usize) -> Result<()> {
        self.post("playcard", Some(&PlayCardBody { index })).await.map(|_| ())
    }

    pub async fn swap_bottom_card(&self) -> Result<()> { self.post::<()>("swapbottomcard", None).await.map(|_| ()) }

    pub async fn leave_game(&self) -> Result<()> { self.post::<()>("leavegame", None).await.map(|_| ()) }

    /// Complete action log of a finished game.
    pub async fn replay(&self, game_id: &Uuid) -> Result<Vec<Action>> {
        let body = ReplayBody { game_id: game_id.to_string() };
        let bytes = self.post("replay", Some(&body)).await?;
        decode_log(&bytes).with_context(|| format!("decoding replay of {game_id}"))
    }
}

/// HTTP status of a failed call, if the server answered at all.
pub fn status_of(err: &anyhow::Error) -> Option<u16> {
    err.chain()
        .find_map(|e| e.downcast_ref::<reqwest::Error>())
        .and_then(|e| e.status())
        .map(|s| s.as_u16())
}
