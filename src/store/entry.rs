//! Per-key lock/value cell.
//!
//! An [`Entry`] is a monitor: the async mutex guards `value` and the lock
//! token, and the [`Notify`] is the wait primitive acquirers park on while
//! the token is held. Releases wake every parked acquirer; each one re-checks
//! the token under the mutex and only one of them installs its own.

use super::types::LockToken;

use tokio::sync::{Mutex, Notify};

#[derive(Debug, Default)]
struct EntryState {
    value: Vec<u8>,
    /// `None` means unlocked.
    lock_token: Option<LockToken>,
}

#[derive(Debug, Default)]
pub struct Entry {
    state: Mutex<EntryState>,
    released: Notify,
}

impl Entry {
    /// Creates an entry that is already held under `token`, so nobody can
    /// reserve it before its creator has written the first value.
    pub fn new_locked(token: LockToken) -> Self {
        Self {
            state: Mutex::new(EntryState {
                value: Vec::new(),
                lock_token: Some(token),
            }),
            released: Notify::new(),
        }
    }

    /// Waits until the entry is unlocked, installs `token` and returns the
    /// current value.
    ///
    /// The token is installed in the same critical section that observes the
    /// entry as free, so dropping this future mid-wait changes nothing.
    pub async fn acquire(&self, token: LockToken) -> Vec<u8> {
        loop {
            // Register interest before checking, otherwise a release landing
            // between the check and the await would be missed.
            let released = self.released.notified();
            tokio::pin!(released);
            released.as_mut().enable();

            {
                let mut state = self.state.lock().await;
                if state.lock_token.is_none() {
                    state.lock_token = Some(token);
                    return state.value.clone();
                }
            }

            released.await;
        }
    }

    /// Clears the lock token and wakes all waiters.
    pub async fn release(&self) {
        self.state.lock().await.lock_token = None;
        self.released.notify_waiters();
    }

    /// Stores `value` if `token` is the current lock token, optionally
    /// releasing the lock. A mismatch mutates nothing and wakes nobody.
    pub async fn write(&self, token: &str, value: Vec<u8>, release: bool) -> bool {
        let mut state = self.state.lock().await;
        match &state.lock_token {
            Some(current) if current == token => {}
            _ => return false,
        }

        state.value = value;
        if release {
            state.lock_token = None;
            drop(state);
            self.released.notify_waiters();
        }
        true
    }

    /// Swaps the held token for `fresh` and stores `value` in one step.
    /// Fails without mutation if `held` is not the current token.
    pub async fn rotate(&self, held: &LockToken, fresh: LockToken, value: Vec<u8>) -> bool {
        let mut state = self.state.lock().await;
        if state.lock_token.as_ref() != Some(held) {
            return false;
        }
        state.lock_token = Some(fresh);
        state.value = value;
        true
    }

    pub async fn read(&self) -> Vec<u8> {
        self.state.lock().await.value.clone()
    }

    pub async fn is_locked(&self) -> bool {
        self.state.lock().await.lock_token.is_some()
    }
}
