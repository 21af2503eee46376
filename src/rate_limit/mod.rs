//! Per-client admission control
//!
//! Fixed-window request counting, applied before any upstream work is
//! attempted. The first request from a client opens a window with count 1;
//! requests inside a live window increment the count and are rejected once
//! the configured threshold is reached. A lapsed window is replaced by a
//! fresh one on the next request.
//!
//! An empty client key is always rejected: if the HTTP layer cannot identify
//! the caller, admission fails closed rather than bypassing the limiter.
//! Expired windows are reclaimed lazily so the map stays bounded.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use crate::utils::time::SharedClock;

/// Outcome of an admission check. This component never errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Allowed,
    Rejected,
}

impl Admission {
    pub fn is_allowed(self) -> bool {
        self == Admission::Allowed
    }
}

#[derive(Debug)]
struct ClientWindow {
    count: u32,
    expires_at: Instant,
}

/// Once the window map grows past this, opening a new window also sweeps
/// expired ones.
const HOUSEKEEPING_THRESHOLD: usize = 1024;

/// Fixed-window rate limiter keyed by client identity.
pub struct FixedWindowLimiter {
    windows: RwLock<HashMap<String, ClientWindow>>,
    max_requests: u32,
    window: Duration,
    clock: SharedClock,
}

impl FixedWindowLimiter {
    pub fn new(max_requests: u32, window: Duration, clock: SharedClock) -> Self {
        Self {
            windows: RwLock::new(HashMap::new()),
            max_requests,
            window,
            clock,
        }
    }

    /// Admit or reject one request from `client_key`.
    ///
    /// Rejection has no side effects beyond the answer itself; the counter is
    /// not advanced past the threshold.
    pub fn try_admit(&self, client_key: &str) -> Admission {
        if client_key.is_empty() || self.max_requests == 0 {
            return Admission::Rejected;
        }

        let now = self.clock.now();
        let mut windows = self.windows.write().unwrap_or_else(|e| e.into_inner());

        if let Some(window) = windows.get_mut(client_key) {
            if now < window.expires_at {
                if window.count >= self.max_requests {
                    return Admission::Rejected;
                }
                window.count += 1;
                return Admission::Allowed;
            }
        }

        if windows.len() >= HOUSEKEEPING_THRESHOLD {
            windows.retain(|_, window| now < window.expires_at);
        }

        windows.insert(
            client_key.to_string(),
            ClientWindow {
                count: 1,
                expires_at: now + self.window,
            },
        );
        Admission::Allowed
    }

    /// Drop every lapsed window.
    pub fn purge_expired(&self) {
        let now = self.clock.now();
        let mut windows = self.windows.write().unwrap_or_else(|e| e.into_inner());
        windows.retain(|_, window| now < window.expires_at);
    }

    /// Number of tracked client windows, including any not yet reclaimed.
    pub fn tracked_clients(&self) -> usize {
        self.windows
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }
}
