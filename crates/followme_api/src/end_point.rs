use std::time::Duration;

use miette::Diagnostic;
use thiserror::Error;

use crate::prelude::*;
use crate::PositionRecord;

/// A json end point on the followme server.
/// The path is relative to the server url, so that the server can be mounted under a prefix.
pub trait EndPoint {
    type RType: DeserializeOwned;
    const PATH: &'static str;

    fn get_url(server: &Url) -> Result<Url, url::ParseError> {
        server.join(Self::PATH)
    }
}

/// `GET /position`. The live snapshot of everything that should be on the map.
pub struct Position;
impl EndPoint for Position {
    type RType = Vec<PositionRecord>;
    const PATH: &'static str = "position";
}

/// Why a single poll didn't produce a snapshot.
/// None of these are fatal. The scheduler just skips the tick.
#[derive(Debug, Clone, Diagnostic, Error, PartialEq)]
pub enum FetchError {
    #[error("transport error: {0}")]
    #[diagnostic(code(fetch_error::transport))]
    Transport(String),
    #[error("server responded with status {0}")]
    #[diagnostic(code(fetch_error::status))]
    Status(u16),
    #[error("failed to decode response body: {0}")]
    #[diagnostic(code(fetch_error::decode))]
    Decode(String),
}

impl From<ureq::Error> for FetchError {
    fn from(e: ureq::Error) -> Self {
        match e {
            ureq::Error::Status(code, _) => Self::Status(code),
            ureq::Error::Transport(t) => Self::Transport(t.to_string()),
        }
    }
}

/// How often a failed fetch is retried before the tick is given up on.
/// The default doesn't retry at all.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub max_retries: u32,
    /// delay before the first retry. doubles for every retry after that
    pub backoff_ms: u64,
}

impl RetryPolicy {
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
        Duration::from_millis(self.backoff_ms.saturating_mul(factor))
    }
}

/// Anything that can produce a snapshot.
/// fetches are run on background threads, so implementors must be shareable.
pub trait PositionSource: Send + Sync + 'static {
    fn fetch(&self) -> Result<Vec<PositionRecord>, FetchError>;
}

pub struct HttpPositionSource {
    agent: HttpClient,
    url: Url,
    retry: RetryPolicy,
}

impl HttpPositionSource {
    pub fn new(server: &Url, timeout: Duration, retry: RetryPolicy) -> Result<Self, url::ParseError> {
        let url = Position::get_url(server)?;
        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build();
        Ok(Self { agent, url, retry })
    }
    pub fn url(&self) -> &Url {
        &self.url
    }

    fn get<E: EndPoint>(&self, url: &Url) -> Result<E::RType, FetchError> {
        let response = self.agent.request_url("GET", url).call()?;
        // ureq accepts any 2xx. only a plain 200 carries a snapshot
        if response.status() != 200 {
            return Err(FetchError::Status(response.status()));
        }
        response
            .into_json()
            .map_err(|e| FetchError::Decode(e.to_string()))
    }
}

impl PositionSource for HttpPositionSource {
    fn fetch(&self) -> Result<Vec<PositionRecord>, FetchError> {
        let mut attempt = 0;
        loop {
            match self.get::<Position>(&self.url) {
                Ok(snapshot) => return Ok(snapshot),
                Err(e) if attempt < self.retry.max_retries => {
                    let delay = self.retry.backoff(attempt);
                    debug!(%e, attempt, ?delay, "retrying position fetch");
                    std::thread::sleep(delay);
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
