use std::fmt;
use thiserror::Error;

/// Opaque proof that the bearer currently holds a key's lock.
///
/// Wrapper around a UUID string. Only the store mints tokens; clients
/// hand them back verbatim on `update`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LockToken(pub String);

impl LockToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LockToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<str> for LockToken {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

/// Failure kinds reported by store operations and the HTTP boundary.
///
/// Every variant maps 1:1 onto a transport status code; none of them
/// leave an entry partially mutated.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// The key has never been `set`.
    #[error("key not found: {0}")]
    NotFound(String),

    /// The presented token is not the key's current lock token.
    #[error("lock id does not match the currently held lock")]
    Unauthorized,

    /// A required request parameter is missing or unreadable.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The lock was not obtained before the configured deadline.
    #[error("timed out waiting for lock on key: {0}")]
    Timeout(String),

    /// Failure that is not the caller's fault.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Snapshot of the key space, used by the periodic stats reporter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub keys: usize,
    pub locked: usize,
}
