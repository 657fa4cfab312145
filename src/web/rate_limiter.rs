// src/web/rate_limiter.rs
//! In-memory, thread-safe rate limiter for the login endpoints.
//! Limits login attempts per IP within a configurable time window.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::tasks::spawn_periodic;

#[derive(Clone)]
pub struct RateLimiter {
    // Map of IP -> (attempt count, first attempt timestamp)
    inner: Arc<Mutex<HashMap<IpAddr, (u32, Instant)>>>,
    pub max_attempts: u32,
    pub window: Duration,
}

impl RateLimiter {
    pub fn new(max_attempts: u32, window: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
            max_attempts,
            window,
        }
    }

    /// Returns true if the IP is allowed to attempt login, false if rate limited.
    pub async fn check_and_increment(&self, ip: IpAddr) -> bool {
        let mut map = self.inner.lock().await;
        let now = Instant::now();
        let entry = map.entry(ip).or_insert((0, now));
        // If window expired, reset
        if now.duration_since(entry.1) >= self.window {
            *entry = (1, now);
            return true;
        }
        if entry.0 < self.max_attempts {
            entry.0 += 1;
            true
        } else {
            false
        }
    }

    /// Drop windows that have fully elapsed. Returns how many were dropped.
    pub async fn cleanup(&self) -> usize {
        let mut map = self.inner.lock().await;
        let now = Instant::now();
        let before = map.len();
        map.retain(|_, &mut (_, ts)| now.duration_since(ts) < self.window);
        before - map.len()
    }

    pub async fn tracked_ips(&self) -> usize {
        self.inner.lock().await.len()
    }

    /// Run [`cleanup`](Self::cleanup) once per window until cancelled.
    pub fn spawn_cleanup(&self) -> CancellationToken {
        let limiter = self.clone();
        spawn_periodic("login_rate_limit_cleanup", self.window, move || {
            let limiter = limiter.clone();
            async move {
                limiter.cleanup().await;
            }
        })
    }
}
