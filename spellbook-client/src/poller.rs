//! Job status poller
//!
//! Watches one submitted job until its result object exists, then fetches
//! the result exactly once.
//!
//! The poller is a small state machine:
//!
//! ```text
//! Submitted -> Polling -> { Ready, TimedOut, Aborted }
//! ```
//!
//! Checks are strictly sequential: the next check is only issued after the
//! previous one returned and the interval elapsed. Transient errors count as
//! "not ready yet" and use up an attempt; non-retryable errors abort at once.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::SpellbookClient;
use crate::error::{ClientError, Result};

/// Where the poller stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Submitted,
    Polling,
    Ready,
    TimedOut,
    Aborted,
}

impl PollState {
    /// No further checks are made from a terminal state
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Ready | Self::TimedOut | Self::Aborted)
    }
}

impl fmt::Display for PollState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Submitted => "SUBMITTED",
            Self::Polling => "POLLING",
            Self::Ready => "READY",
            Self::TimedOut => "TIMED_OUT",
            Self::Aborted => "ABORTED",
        };
        f.write_str(name)
    }
}

/// Poller configuration
///
/// The worst-case wait is `interval * (max_attempts - 1)`, since the first
/// check runs immediately and there is no wait after the last one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollerConfig {
    /// Pause between two status checks
    pub interval: Duration,

    /// Checks allowed before giving up
    pub max_attempts: u32,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(5000),
            max_attempts: 20,
        }
    }
}

impl PollerConfig {
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts,
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Expected environment variables:
    /// - POLL_INTERVAL_MS (optional, milliseconds, default: 5000)
    /// - MAX_POLL_ATTEMPTS (optional, default: 20)
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`PollerConfig::from_env`] but reading variables through `lookup`
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let interval = match lookup("POLL_INTERVAL_MS") {
            Some(raw) => raw
                .parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|_| anyhow::anyhow!("POLL_INTERVAL_MS must be a number, got {:?}", raw))?,
            None => defaults.interval,
        };

        let max_attempts = match lookup("MAX_POLL_ATTEMPTS") {
            Some(raw) => raw
                .parse::<u32>()
                .map_err(|_| anyhow::anyhow!("MAX_POLL_ATTEMPTS must be a number, got {:?}", raw))?,
            None => defaults.max_attempts,
        };

        let config = Self {
            interval,
            max_attempts,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.interval.is_zero() {
            anyhow::bail!("poll interval must be greater than 0");
        }

        if self.max_attempts == 0 {
            anyhow::bail!("max_attempts must be greater than 0");
        }

        Ok(())
    }
}

/// Ways polling can end without a result
#[derive(Debug, Error)]
pub enum PollError {
    #[error("job {job_id} is still processing after {attempts} checks, check back later")]
    TimedOut { job_id: Uuid, attempts: u32 },

    #[error("status check for job {job_id} was rejected: {source}")]
    Rejected {
        job_id: Uuid,
        #[source]
        source: ClientError,
    },

    #[error("failed to fetch the result of job {job_id}: {source}")]
    FetchFailed {
        job_id: Uuid,
        #[source]
        source: ClientError,
    },

    #[error("result of job {job_id} is malformed: {reason}")]
    MalformedResult { job_id: Uuid, reason: String },

    #[error("polling of job {0} was cancelled")]
    Cancelled(Uuid),

    #[error("poller for job {0} has already finished")]
    Finished(Uuid),
}

/// Outcome of one successful step
#[derive(Debug, PartialEq)]
pub enum Tick<T> {
    /// Not ready yet; `attempt` checks have come back negative so far
    Pending { attempt: u32 },
    Ready(T),
}

/// Where the poller reads job status and results from
#[async_trait]
pub trait StatusSource: Send + Sync {
    /// Existence check only; must not transfer the result body
    async fn check_status(&self, job_id: Uuid) -> Result<bool>;

    /// Reads the full result
    async fn fetch_result(&self, job_id: Uuid) -> Result<serde_json::Value>;
}

#[async_trait]
impl StatusSource for SpellbookClient {
    async fn check_status(&self, job_id: Uuid) -> Result<bool> {
        self.job_status(job_id).await
    }

    async fn fetch_result(&self, job_id: Uuid) -> Result<serde_json::Value> {
        self.job_result(job_id).await
    }
}

/// Waits between two checks
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeps on the tokio timer, so paused test time applies
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Poller for a single job
///
/// Each instance keeps its own attempt counter and state; several pollers
/// may watch the same job without affecting each other.
pub struct JobPoller<S, Z = TokioSleeper> {
    job_id: Uuid,
    source: S,
    sleeper: Z,
    config: PollerConfig,
    cancel: CancellationToken,
    state: PollState,
    attempts: u32,
    history: Vec<PollState>,
}

impl<S: StatusSource> JobPoller<S> {
    /// Creates a poller in the `Submitted` state
    pub fn new(job_id: Uuid, source: S, config: PollerConfig) -> Self {
        Self {
            job_id,
            source,
            sleeper: TokioSleeper,
            config,
            cancel: CancellationToken::new(),
            state: PollState::Submitted,
            attempts: 0,
            history: vec![PollState::Submitted],
        }
    }
}

impl<S: StatusSource, Z: Sleeper> JobPoller<S, Z> {
    /// Replaces the timer used between checks
    pub fn with_sleeper<Z2: Sleeper>(self, sleeper: Z2) -> JobPoller<S, Z2> {
        JobPoller {
            job_id: self.job_id,
            source: self.source,
            sleeper,
            config: self.config,
            cancel: self.cancel,
            state: self.state,
            attempts: self.attempts,
            history: self.history,
        }
    }

    /// Ties the poller to an existing token
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Token that stops the poller when cancelled
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn job_id(&self) -> Uuid {
        self.job_id
    }

    pub fn state(&self) -> PollState {
        self.state
    }

    /// Negative or failed checks so far
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Every state entered, starting with `Submitted`
    pub fn history(&self) -> &[PollState] {
        &self.history
    }

    pub fn config(&self) -> &PollerConfig {
        &self.config
    }

    fn transition(&mut self, next: PollState) {
        debug!("Job {} poller: {} -> {}", self.job_id, self.state, next);
        self.state = next;
        self.history.push(next);
    }

    fn cancelled(&mut self) -> PollError {
        info!("Polling of job {} cancelled", self.job_id);
        self.transition(PollState::Aborted);
        PollError::Cancelled(self.job_id)
    }

    /// Performs one status check, and the fetch if the job is ready
    ///
    /// Returns `PollError::Finished` without any I/O once the poller is in
    /// a terminal state, so a result is never fetched twice.
    pub async fn tick<T: DeserializeOwned>(&mut self) -> std::result::Result<Tick<T>, PollError> {
        if self.state.is_terminal() {
            return Err(PollError::Finished(self.job_id));
        }
        if self.cancel.is_cancelled() {
            return Err(self.cancelled());
        }

        let cancel = self.cancel.clone();
        let check = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            result = self.source.check_status(self.job_id) => Some(result),
        };
        let Some(check) = check else {
            return Err(self.cancelled());
        };

        match check {
            Ok(true) => {
                self.transition(PollState::Ready);
                self.fetch().await.map(Tick::Ready)
            }
            Ok(false) => self.not_ready(),
            Err(e) if e.is_retryable() => {
                warn!("Status check for job {} failed, will retry: {}", self.job_id, e);
                self.not_ready()
            }
            Err(e) => {
                warn!("Status check for job {} rejected: {}", self.job_id, e);
                self.transition(PollState::Aborted);
                Err(PollError::Rejected {
                    job_id: self.job_id,
                    source: e,
                })
            }
        }
    }

    fn not_ready<T>(&mut self) -> std::result::Result<Tick<T>, PollError> {
        self.attempts += 1;

        if self.attempts >= self.config.max_attempts {
            info!("Job {} not ready after {} checks, giving up", self.job_id, self.attempts);
            self.transition(PollState::TimedOut);
            return Err(PollError::TimedOut {
                job_id: self.job_id,
                attempts: self.attempts,
            });
        }

        self.transition(PollState::Polling);
        Ok(Tick::Pending {
            attempt: self.attempts,
        })
    }

    async fn fetch<T: DeserializeOwned>(&mut self) -> std::result::Result<T, PollError> {
        let cancel = self.cancel.clone();
        let fetched = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            result = self.source.fetch_result(self.job_id) => Some(result),
        };
        let Some(fetched) = fetched else {
            return Err(self.cancelled());
        };

        let value = match fetched {
            Ok(value) => value,
            Err(ClientError::MalformedResult(reason)) => {
                warn!("Result of job {} is malformed: {}", self.job_id, reason);
                self.transition(PollState::Aborted);
                return Err(PollError::MalformedResult {
                    job_id: self.job_id,
                    reason,
                });
            }
            Err(e) => {
                warn!("Fetching result of job {} failed: {}", self.job_id, e);
                self.transition(PollState::Aborted);
                return Err(PollError::FetchFailed {
                    job_id: self.job_id,
                    source: e,
                });
            }
        };

        serde_json::from_value(value).map_err(|e| {
            warn!("Result of job {} is malformed: {}", self.job_id, e);
            self.transition(PollState::Aborted);
            PollError::MalformedResult {
                job_id: self.job_id,
                reason: e.to_string(),
            }
        })
    }

    /// Polls until the result is ready, the budget runs out, or the
    /// poller is cancelled
    pub async fn run<T: DeserializeOwned>(&mut self) -> std::result::Result<T, PollError> {
        self.run_with(|_| {}).await
    }

    /// Like [`JobPoller::run`], calling `on_pending` after every negative check
    pub async fn run_with<T, F>(&mut self, mut on_pending: F) -> std::result::Result<T, PollError>
    where
        T: DeserializeOwned,
        F: FnMut(u32),
    {
        info!(
            "Polling job {} (interval: {:?}, max attempts: {})",
            self.job_id, self.config.interval, self.config.max_attempts
        );

        loop {
            match self.tick::<T>().await? {
                Tick::Ready(result) => {
                    info!("Job {} ready after {} pending checks", self.job_id, self.attempts);
                    return Ok(result);
                }
                Tick::Pending { attempt } => {
                    on_pending(attempt);

                    let cancel = self.cancel.clone();
                    let cancelled = tokio::select! {
                        biased;
                        _ = cancel.cancelled() => true,
                        _ = self.sleeper.sleep(self.config.interval) => false,
                    };
                    if cancelled {
                        return Err(self.cancelled());
                    }
                }
            }
        }
    }
}
