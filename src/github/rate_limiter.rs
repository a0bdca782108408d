//! Shared rate-limit budget

use crate::github::error::{GitHubError, GitHubResult};
use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::sleep;

/// Core API quota for an authenticated token
const DEFAULT_HOURLY_LIMIT: u32 = 5000;

struct RateState {
    remaining: u32,
    reset_time: DateTime<Utc>,
}

impl RateState {
    fn check_and_reset_if_expired(&mut self) {
        // Past the reset time the quota is refilled
        let now = Utc::now();
        if now > self.reset_time {
            self.remaining = DEFAULT_HOURLY_LIMIT;
            self.reset_time = now + chrono::Duration::hours(1);
        }
    }
}

/// Point-in-time view of the budget
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RateLimitSnapshot {
    pub remaining: u32,
    pub reset_time: DateTime<Utc>,
    pub requests_made: u64,
    pub exhausted: bool,
}

/// Rate-limit context shared by every fetcher call of a run.
///
/// Each request takes one unit under the write lock, which is released before
/// the request goes out. Response headers feed the real figures back in.
pub struct RateLimitContext {
    state: RwLock<RateState>,
    requests: AtomicU64,
    exhausted: AtomicBool,
    buffer: u32,
    max_wait: Duration,
}

impl RateLimitContext {
    pub fn new(buffer: u32, max_wait: Duration) -> Self {
        Self::with_state(
            DEFAULT_HOURLY_LIMIT,
            Utc::now() + chrono::Duration::hours(1),
            buffer,
            max_wait,
        )
    }

    pub fn with_state(
        remaining: u32,
        reset_time: DateTime<Utc>,
        buffer: u32,
        max_wait: Duration,
    ) -> Self {
        Self {
            state: RwLock::new(RateState {
                remaining,
                reset_time,
            }),
            requests: AtomicU64::new(0),
            exhausted: AtomicBool::new(false),
            buffer,
            max_wait,
        }
    }

    /// Record the figures reported by the API
    pub async fn update(&self, remaining: u32, reset_time: DateTime<Utc>) {
        let mut state = self.state.write().await;
        state.remaining = remaining;
        state.reset_time = reset_time;
    }

    /// Take one request from the budget, waiting for the reset if it is close enough.
    pub async fn acquire(&self) -> GitHubResult<()> {
        loop {
            if self.is_exhausted() {
                let state = self.state.read().await;
                return Err(GitHubError::RateLimitExhausted {
                    remaining: state.remaining,
                    reset_time: state.reset_time,
                });
            }

            let wait_time = {
                let mut state = self.state.write().await;
                state.check_and_reset_if_expired();

                if state.remaining > self.buffer {
                    state.remaining -= 1;
                    self.requests.fetch_add(1, Ordering::Relaxed);
                    return Ok(());
                }

                let wait_time = (state.reset_time - Utc::now())
                    .to_std()
                    .unwrap_or(Duration::from_secs(1));

                if wait_time > self.max_wait {
                    warn!(
                        "Rate limit budget exhausted ({} left, resets at {}); stopping new work",
                        state.remaining, state.reset_time
                    );
                    self.exhausted.store(true, Ordering::SeqCst);
                    return Err(GitHubError::RateLimitExhausted {
                        remaining: state.remaining,
                        reset_time: state.reset_time,
                    });
                }
                wait_time
            };

            info!("Rate limit approaching, waiting {wait_time:?}");
            sleep(wait_time).await;
        }
    }

    /// Flag the budget as spent, e.g. after the API answered with a rate-limit error.
    pub fn mark_exhausted(&self) {
        self.exhausted.store(true, Ordering::SeqCst);
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted.load(Ordering::SeqCst)
    }

    pub fn requests_made(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }

    pub async fn remaining(&self) -> u32 {
        self.state.read().await.remaining
    }

    pub async fn snapshot(&self) -> RateLimitSnapshot {
        let state = self.state.read().await;
        RateLimitSnapshot {
            remaining: state.remaining,
            reset_time: state.reset_time,
            requests_made: self.requests_made(),
            exhausted: self.is_exhausted(),
        }
    }
}
