use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::core::config::SecurityConfig;
use crate::features::rate_limits::dtos::UserRateLimitStatusDto;
use crate::modules::memstore::Clock;

#[derive(Debug, Clone, Copy)]
struct RateWindow {
    count: u32,
    reset_at: DateTime<Utc>,
}

/// Outcome of counting one request against an identity's window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    Allowed { remaining: u32 },
    Limited { retry_after_secs: u64 },
}

/// Fixed-window request counter keyed by caller identity
pub struct RateLimitService {
    windows: Mutex<HashMap<String, RateWindow>>,
    max_requests: u32,
    window: Duration,
    clock: Arc<dyn Clock>,
}

impl RateLimitService {
    pub fn with_clock(config: &SecurityConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            windows: Mutex::new(HashMap::new()),
            max_requests: config.rate_limit_max_requests,
            window: config.rate_limit_window,
            clock,
        }
    }

    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    fn window_delta(&self) -> chrono::Duration {
        chrono::Duration::milliseconds(self.window.as_millis() as i64)
    }

    /// Count one request for `identity`.
    ///
    /// A window opens on the first request and is replaced by a fresh one once
    /// `now` is past its reset time. A rejected request does not increment the
    /// counter.
    pub async fn check(&self, identity: &str) -> RateLimitDecision {
        let now = self.clock.now();
        let mut windows = self.windows.lock().await;

        match windows.get_mut(identity) {
            Some(window) if now <= window.reset_at => {
                if window.count >= self.max_requests {
                    let retry_after_secs = retry_after_secs(window.reset_at, now);
                    warn!(
                        identity = %identity,
                        retry_after_secs,
                        "Rate limit exceeded"
                    );
                    return RateLimitDecision::Limited { retry_after_secs };
                }

                window.count += 1;
                RateLimitDecision::Allowed {
                    remaining: self.max_requests.saturating_sub(window.count),
                }
            }
            _ => {
                windows.insert(
                    identity.to_string(),
                    RateWindow {
                        count: 1,
                        reset_at: now + self.window_delta(),
                    },
                );
                debug!(identity = %identity, "Opened rate limit window");
                RateLimitDecision::Allowed {
                    remaining: self.max_requests.saturating_sub(1),
                }
            }
        }
    }

    /// Current window for `identity` without counting a request
    pub async fn status(&self, identity: &str) -> UserRateLimitStatusDto {
        let now = self.clock.now();
        let windows = self.windows.lock().await;

        let open = windows
            .get(identity)
            .filter(|window| now <= window.reset_at)
            .copied();

        let (requests_used, resets_at) = match open {
            Some(window) => (window.count, Some(window.reset_at)),
            None => (0, None),
        };

        UserRateLimitStatusDto {
            identity: identity.to_string(),
            requests_used,
            requests_remaining: self.max_requests.saturating_sub(requests_used),
            max_requests: self.max_requests,
            window_secs: self.window.as_secs(),
            limited: requests_used >= self.max_requests,
            resets_at,
        }
    }

    /// Drop windows whose reset time has passed. Returns how many were dropped.
    pub async fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut windows = self.windows.lock().await;
        let before = windows.len();
        windows.retain(|_, window| now <= window.reset_at);
        before - windows.len()
    }
}

/// Whole seconds until `reset_at`, rounded up
fn retry_after_secs(reset_at: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    let millis = (reset_at - now).num_milliseconds().max(0) as u64;
    millis.div_ceil(1000)
}
