//! Reservation Store Module
//!
//! Implements the in-memory key/value space and its per-key lock protocol.
//!
//! ## Core Concepts
//! - **Entry**: One key's value and lock token, guarded by its own mutex and
//!   paired with a wake-up primitive (monitor pattern).
//! - **Store**: A concurrent map from key to `Entry`. The map lock is always
//!   released before an entry lock is awaited, so a blocked key never stalls
//!   lookups of other keys.
//! - **Lock tokens**: Minted by an injected `TokenGenerator`. Holding the
//!   current token is the only way to write a key.
//!
//! ## Per-key state machine
//! `UNLOCKED --reserve/set--> LOCKED(t) --update(t, release=true)--> UNLOCKED`.
//! `update(t, release=false)` keeps the lock; any other token is rejected
//! without mutating anything.

pub mod entry;
pub mod memory;
pub mod token;
pub mod types;

pub use memory::Store;
pub use token::{TokenGenerator, UuidTokens};
pub use types::{LockToken, StoreError, StoreStats};
