use crate::repository::{CollaboratorError, RateLimiter};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Default sends allowed per window.
pub const DEFAULT_MAX_ATTEMPTS: usize = 5;

/// Default window: 15 minutes.
pub const DEFAULT_WINDOW_SECS: u64 = 900;

/// Limit for one route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Maximum number of requests allowed within the window.
    pub max_attempts: usize,
    /// Duration of the sliding window.
    pub window: Duration,
}

impl RateLimitConfig {
    #[must_use]
    pub fn new(max_attempts: usize, window: Duration) -> Self {
        Self {
            max_attempts,
            window,
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            window: Duration::from_secs(DEFAULT_WINDOW_SECS),
        }
    }
}

#[derive(Debug, Default)]
struct Window {
    timestamps: Vec<Instant>,
}

impl Window {
    fn prune(&mut self, now: Instant, window: Duration) {
        self.timestamps.retain(|&t| now.duration_since(t) < window);
    }
}

#[derive(Debug, Default)]
struct LimiterState {
    /// Keyed by `(route_key, key)`.
    windows: HashMap<(String, String), Window>,
}

/// Sliding-window limiter with per-route limits.
///
/// Routes without an explicit limit use the default config.
#[derive(Debug, Default)]
pub struct SlidingWindowRateLimiter {
    default: RateLimitConfig,
    routes: HashMap<String, RateLimitConfig>,
    state: Mutex<LimiterState>,
}

impl SlidingWindowRateLimiter {
    #[must_use]
    pub fn new(default: RateLimitConfig) -> Self {
        Self {
            default,
            routes: HashMap::new(),
            state: Mutex::new(LimiterState::default()),
        }
    }

    /// Set the limit for one route key, e.g. `email_otp:send`.
    #[must_use]
    pub fn with_route(mut self, route_key: impl Into<String>, config: RateLimitConfig) -> Self {
        self.routes.insert(route_key.into(), config);
        self
    }

    fn config_for(&self, route_key: &str) -> RateLimitConfig {
        self.routes.get(route_key).copied().unwrap_or(self.default)
    }

    /// Check and record one request at `now`.
    pub fn check_at(&self, key: &str, route_key: &str, now: Instant) -> bool {
        let config = self.config_for(route_key);
        let mut state = self.state.lock();
        let window = state
            .windows
            .entry((route_key.to_string(), key.to_string()))
            .or_default();
        window.prune(now, config.window);

        if window.timestamps.len() >= config.max_attempts {
            return false;
        }
        window.timestamps.push(now);
        true
    }

    /// Requests still counted against `key` on `route_key`.
    #[must_use]
    pub fn count(&self, key: &str, route_key: &str) -> usize {
        let config = self.config_for(route_key);
        let now = Instant::now();
        self.state
            .lock()
            .windows
            .get(&(route_key.to_string(), key.to_string()))
            .map_or(0, |w| {
                w.timestamps
                    .iter()
                    .filter(|&&t| now.duration_since(t) < config.window)
                    .count()
            })
    }

    /// Drop keys with no requests left in their window. Returns how many were dropped.
    pub fn cleanup(&self) -> usize {
        let now = Instant::now();
        let mut state = self.state.lock();
        let before = state.windows.len();
        let routes = &self.routes;
        let default = self.default;
        state.windows.retain(|(route_key, _), window| {
            let config = routes.get(route_key).copied().unwrap_or(default);
            window.prune(now, config.window);
            !window.timestamps.is_empty()
        });
        before - state.windows.len()
    }

    #[must_use]
    pub fn tracked_keys(&self) -> usize {
        self.state.lock().windows.len()
    }
}

#[async_trait]
impl RateLimiter for SlidingWindowRateLimiter {
    async fn check_limit_for_path(
        &self,
        key: &str,
        route_key: &str,
    ) -> Result<bool, CollaboratorError> {
        Ok(self.check_at(key, route_key, Instant::now()))
    }
}
