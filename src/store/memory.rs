use super::entry::Entry;
use super::token::{TokenGenerator, UuidTokens};
use super::types::{LockToken, StoreError, StoreStats};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry as Slot;
use std::sync::Arc;
use std::time::Duration;

/// The key space: an arena of [`Entry`] cells addressed by key.
///
/// Two lock tiers are involved in every operation. The map shard lock is
/// taken only long enough to clone the entry handle out, and is always
/// dropped before the entry's own lock is awaited. Keys are never removed.
pub struct Store {
    entries: DashMap<String, Arc<Entry>>,
    tokens: Arc<dyn TokenGenerator>,
    /// Upper bound on how long `reserve`/`set` wait for a held lock.
    /// `None` waits indefinitely.
    lock_timeout: Option<Duration>,
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    pub fn new() -> Self {
        Self::with_tokens(Arc::new(UuidTokens))
    }

    pub fn with_tokens(tokens: Arc<dyn TokenGenerator>) -> Self {
        Self {
            entries: DashMap::new(),
            tokens,
            lock_timeout: None,
        }
    }

    pub fn with_lock_timeout(mut self, lock_timeout: Option<Duration>) -> Self {
        self.lock_timeout = lock_timeout;
        self
    }

    fn lookup(&self, key: &str) -> Option<Arc<Entry>> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    async fn wait_for(
        &self,
        key: &str,
        entry: &Entry,
        token: LockToken,
    ) -> Result<Vec<u8>, StoreError> {
        match self.lock_timeout {
            Some(limit) => tokio::time::timeout(limit, entry.acquire(token))
                .await
                .map_err(|_| {
                    tracing::warn!("Gave up waiting for lock on '{}' after {:?}", key, limit);
                    StoreError::Timeout(key.to_string())
                }),
            None => Ok(entry.acquire(token).await),
        }
    }

    /// Acquires the lock on an existing key and returns the new token along
    /// with the current value. Never creates the key.
    pub async fn reserve(&self, key: &str) -> Result<(LockToken, Vec<u8>), StoreError> {
        let Some(entry) = self.lookup(key) else {
            tracing::warn!("RESERVE: key '{}' does not exist", key);
            return Err(StoreError::NotFound(key.to_string()));
        };

        let token = self.tokens.generate();
        let value = self.wait_for(key, &entry, token.clone()).await?;

        tracing::debug!("RESERVE: '{}' locked under {}", key, token);
        Ok((token, value))
    }

    /// Writes `value` if `token` holds the key's lock, then releases the lock
    /// when `release` is set.
    pub async fn update(
        &self,
        key: &str,
        token: &str,
        value: Vec<u8>,
        release: bool,
    ) -> Result<(), StoreError> {
        let Some(entry) = self.lookup(key) else {
            tracing::warn!("UPDATE: key '{}' does not exist", key);
            return Err(StoreError::NotFound(key.to_string()));
        };

        if !entry.write(token, value, release).await {
            tracing::warn!("UPDATE: rejected stale or foreign lock id for '{}'", key);
            return Err(StoreError::Unauthorized);
        }

        tracing::debug!("UPDATE: '{}' written (release={})", key, release);
        Ok(())
    }

    /// Creates the key if needed, waits for its lock, stores `value` and
    /// leaves the key locked under a freshly issued token.
    pub async fn set(&self, key: &str, value: Vec<u8>) -> Result<LockToken, StoreError> {
        let held = self.tokens.generate();

        // Map write lock is held only for this statement.
        let (entry, created) = match self.entries.entry(key.to_string()) {
            Slot::Occupied(slot) => (slot.get().clone(), false),
            Slot::Vacant(slot) => {
                let entry = Arc::new(Entry::new_locked(held.clone()));
                slot.insert(entry.clone());
                (entry, true)
            }
        };

        if created {
            tracing::info!("SET: created key '{}'", key);
        } else {
            self.wait_for(key, &entry, held.clone()).await?;
        }

        let fresh = self.tokens.generate();
        if !entry.rotate(&held, fresh.clone(), value).await {
            tracing::error!("SET: lost the lock on '{}' while holding it", key);
            return Err(StoreError::Internal(format!("lock on '{}' was lost", key)));
        }

        tracing::debug!("SET: '{}' locked under {}", key, fresh);
        Ok(fresh)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub async fn stats(&self) -> StoreStats {
        // Collect handles first so no shard guard is held across an await.
        let entries: Vec<Arc<Entry>> = self
            .entries
            .iter()
            .map(|entry| entry.value().clone())
            .collect();

        let mut locked = 0;
        for entry in &entries {
            if entry.is_locked().await {
                locked += 1;
            }
        }

        StoreStats {
            keys: entries.len(),
            locked,
        }
    }
}
