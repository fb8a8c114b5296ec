#![forbid(unsafe_code)]

//! Fixed-window request budget per client address.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

/// Windows are pruned once the table grows past this many clients.
const PRUNE_THRESHOLD: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed { remaining: u32 },
    Limited { retry_after: Duration },
}

#[derive(Debug, Clone)]
struct Window {
    count: u32,
    started: Instant,
}

#[derive(Debug, Default)]
pub struct RateLimiter {
    windows: Mutex<HashMap<String, Window>>,
}

impl RateLimiter {
    pub async fn check(&self, key: &str, cfg: &RateLimitConfig, now: Instant) -> RateDecision {
        let mut lock = self.windows.lock().await;
        if lock.len() > PRUNE_THRESHOLD {
            lock.retain(|_, w| now.duration_since(w.started) < cfg.window);
        }
        let window = lock.entry(key.to_string()).or_insert_with(|| Window {
            count: 0,
            started: now,
        });
        if now.duration_since(window.started) >= cfg.window {
            window.count = 0;
            window.started = now;
        }
        if window.count >= cfg.max_requests {
            let elapsed = now.duration_since(window.started);
            return RateDecision::Limited {
                retry_after: cfg.window.saturating_sub(elapsed),
            };
        }
        window.count += 1;
        RateDecision::Allowed {
            remaining: cfg.max_requests - window.count,
        }
    }
}
