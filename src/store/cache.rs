//! Verdict cache tier
//!
//! [`CacheTier`] is the narrow key-value contract the result store needs:
//! `GET key` and `SET key value EX ttl`. [`MemoryCacheTier`] implements it
//! in-process with lazy expiry on read plus a periodic sweep.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::task::JoinHandle;
use tracing::debug;

use super::errors::StoreResult;

/// Key-value store with per-key time-to-live
#[async_trait]
pub trait CacheTier: Send + Sync {
    /// Value under `key`, `None` when absent or expired
    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Store `value` under `key` for `ttl`, replacing any previous value
    async fn set_ex(&self, key: &str, value: String, ttl: Duration) -> StoreResult<()>;

    async fn ping(&self) -> StoreResult<()>;
}

#[derive(Debug, Clone)]
struct Slot {
    value: String,
    expires_at: Instant,
}

/// In-process TTL map
#[derive(Debug, Default)]
pub struct MemoryCacheTier {
    slots: DashMap<String, Slot>,
}

impl MemoryCacheTier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys, expired-but-unswept ones included
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Drop every expired key, returning how many were removed
    pub fn sweep_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.slots.len();
        self.slots.retain(|_, slot| slot.expires_at > now);
        before.saturating_sub(self.slots.len())
    }

    /// Sweep expired keys every `every` until the task is aborted
    pub fn start_sweep_task(self: Arc<Self>, every: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            loop {
                interval.tick().await;
                let removed = self.sweep_expired();
                if removed > 0 {
                    debug!(removed, "Swept expired cache entries");
                }
            }
        })
    }
}

#[async_trait]
impl CacheTier for MemoryCacheTier {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let now = Instant::now();
        if let Some(slot) = self.slots.get(key) {
            if slot.expires_at > now {
                return Ok(Some(slot.value.clone()));
            }
        } else {
            return Ok(None);
        }
        // expired: remove only if nobody refreshed it meanwhile
        self.slots.remove_if(key, |_, slot| slot.expires_at <= now);
        Ok(None)
    }

    async fn set_ex(&self, key: &str, value: String, ttl: Duration) -> StoreResult<()> {
        self.slots.insert(
            key.to_string(),
            Slot {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}
