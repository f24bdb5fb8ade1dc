//! Replay protection for authorization nonces.
//!
//! A nonce is admitted at most once within the configured retention window.
//! The store is consulted after an authorization is found semantically valid
//! and before any validator backend is invoked, and is rolled back
//! (`remove`) if the validator chain subsequently fails the authorization —
//! see [`crate::gate::PaymentGate`].

use crate::errors::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use std::time::{Duration, Instant};

/// A concurrency-safe store of consumed nonces.
///
/// Implementations MAY be networked (e.g. Redis-backed) for multi-instance
/// deployments; all methods are therefore `async`.
#[async_trait]
pub trait ReplayStore: Send + Sync {
    /// Atomically inserts `key` if absent. Returns `true` if this call
    /// performed the insertion, `false` if `key` was already present.
    async fn try_insert(&self, key: &str) -> Result<bool>;

    /// Removes `key`, undoing a [`ReplayStore::try_insert`] after a
    /// downstream validator rejects the authorization.
    async fn remove(&self, key: &str) -> Result<()>;

    /// Returns whether `key` is currently recorded.
    async fn has(&self, key: &str) -> Result<bool>;
}

/// An in-memory [`ReplayStore`] backed by a [`dashmap::DashMap`] keyed by
/// nonce, storing the insertion instant so expired entries can be evicted
/// lazily rather than via a background sweep.
pub struct InMemoryReplayStore {
    entries: DashMap<String, Instant>,
    retention: Duration,
}

impl InMemoryReplayStore {
    /// Builds a store that forgets a nonce `retention` after it was
    /// inserted, allowing it to be reused (the on-chain authorization itself
    /// will already be expired by then).
    pub fn new(retention: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            retention,
        }
    }

    fn is_expired(&self, inserted_at: Instant) -> bool {
        inserted_at.elapsed() >= self.retention
    }

    /// Drops every entry older than the retention window. Called opportunistically
    /// from `try_insert`/`has` rather than on a timer.
    fn evict_expired(&self) {
        self.entries
            .retain(|_, inserted_at| !self.is_expired(*inserted_at));
    }
}

#[async_trait]
impl ReplayStore for InMemoryReplayStore {
    async fn try_insert(&self, key: &str) -> Result<bool> {
        self.evict_expired();
        match self.entries.entry(key.to_string()) {
            dashmap::mapref::entry::Entry::Occupied(_) => Ok(false),
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(Instant::now());
                Ok(true)
            }
        }
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }

    async fn has(&self, key: &str) -> Result<bool> {
        self.evict_expired();
        Ok(self.entries.contains_key(key))
    }
}
