//! Cache entry type
//!
//! An entry owns the cached JSON value and its expiry bookkeeping.
//! Entries are immutable once stored; replacement is the only update.

use serde_json::Value;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The cached value
    pub value: Value,
    /// When this entry was stored
    pub stored_at: Instant,
    /// When this entry stops being served (stored_at + ttl)
    pub expires_at: Instant,
}

impl CacheEntry {
    /// Create an entry expiring `ttl` from now.
    pub fn new(value: Value, ttl: Duration) -> Self {
        let now = Instant::now();
        Self {
            value,
            stored_at: now,
            expires_at: now + ttl,
        }
    }

    /// An entry is expired once its deadline has passed.
    pub fn is_expired(&self) -> bool {
        Instant::now() > self.expires_at
    }

    /// How long ago the entry was stored.
    pub fn age(&self) -> Duration {
        self.stored_at.elapsed()
    }
}
