//! In-memory JWT token blacklist backing logout.
//!
//! Each revoked token is kept until its own natural expiry, after which it is
//! treated as absent. Expired entries are dropped lazily by `is_revoked` and
//! eagerly by a periodic janitor (see [`TokenBlacklist::spawn_janitor`]).
//!
//! The raw token string is the key. Entries never outlive the token they
//! revoke, so the map stays bounded by the number of tokens logged out within
//! one token lifetime.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::tasks::spawn_periodic;

/// Cap for ttls too large to add to the clock.
const FAR_FUTURE: Duration = Duration::from_secs(100 * 365 * 86_400);

#[derive(Clone, Default)]
pub struct TokenBlacklist {
    inner: Arc<RwLock<HashMap<String, Instant>>>,
}

impl TokenBlacklist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Revoke `token` for `ttl`. Revoking again overwrites the expiry.
    pub fn revoke(&self, token: impl Into<String>, ttl: Duration) {
        let now = Instant::now();
        let expires_at = now.checked_add(ttl).unwrap_or_else(|| now + FAR_FUTURE);
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(token.into(), expires_at);
    }

    /// True iff `token` was revoked and that revocation has not yet expired.
    ///
    /// An expired entry found here is removed before returning `false`.
    pub fn is_revoked(&self, token: &str) -> bool {
        let expires_at = {
            let map = self.inner.read().unwrap_or_else(PoisonError::into_inner);
            match map.get(token) {
                Some(expires_at) => *expires_at,
                None => return false,
            }
        };

        let now = Instant::now();
        if now < expires_at {
            return true;
        }

        // Read guard is released; re-check under the write lock in case the
        // token was revoked again in between.
        let mut map = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if map.get(token).is_some_and(|exp| *exp <= now) {
            map.remove(token);
        }
        false
    }

    /// Remove every expired entry. Returns how many were removed.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut map = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let before = map.len();
        map.retain(|_, expires_at| now < *expires_at);
        before - map.len()
    }

    /// Number of entries physically held, expired or not.
    pub fn len(&self) -> usize {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run [`sweep`](Self::sweep) every `interval` until the returned token is cancelled.
    pub fn spawn_janitor(&self, interval: Duration) -> CancellationToken {
        let blacklist = self.clone();
        spawn_periodic("token_blacklist_janitor", interval, move || {
            let blacklist = blacklist.clone();
            async move {
                let removed = blacklist.sweep();
                if removed > 0 {
                    tracing::debug!(removed, remaining = blacklist.len(), "Swept expired revoked tokens");
                }
            }
        })
    }
}
