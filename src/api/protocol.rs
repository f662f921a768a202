//! HTTP Protocol
//!
//! Defines the public endpoints and the JSON bodies exchanged with clients.
//! Request bodies for `set`/`update` are the raw value bytes, not JSON.

use serde::{Deserialize, Serialize};

// --- API Endpoints ---

/// Acquire a key's lock and read its value.
pub const ENDPOINT_RESERVE: &str = "/reservations/:key";
/// Write a value under a held lock; `?release=true|false` is required.
pub const ENDPOINT_UPDATE: &str = "/values/:key/:lock_id";
/// Create-or-reuse a key, write it and leave it locked.
pub const ENDPOINT_SET: &str = "/values/:key";

// --- Data Transfer Objects ---

/// Success body for `reserve` and `set`.
///
/// Empty fields are omitted, so `set` answers `{"lock_id": "..."}` only.
#[derive(Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct LockResponse {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub lock_id: String,
    /// The stored bytes rendered as UTF-8 text.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub value: String,
}

/// Query string of the update endpoint.
#[derive(Debug, Deserialize)]
pub struct UpdateParams {
    /// Only the literal `true` releases; any other value retains the lock.
    pub release: Option<String>,
}

impl UpdateParams {
    pub fn release(&self) -> Option<bool> {
        self.release.as_deref().map(|flag| flag == "true")
    }
}

/// Body of every error response.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    pub error: String,
}
