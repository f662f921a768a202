//! Reservation Store Library
//!
//! An in-memory key/value store served over HTTP, where every read or write
//! of a key happens under an exclusive, cooperatively acquired lock.
//!
//! ## Modules
//! - **`store`**: The key space and the per-key lock protocol (`reserve`,
//!   `update`, `set`). Waiters park until a release wakes them; the map lock
//!   is never held while waiting on a key.
//! - **`api`**: The axum boundary. Extracts path/query/body values, calls the
//!   store and maps `StoreError` onto HTTP status codes.
//! - **`config`**: Command-line configuration for the binary (`main.rs`).
//! - **`shutdown`**: Ctrl+C handling with a bounded drain.

pub mod api;
pub mod config;
pub mod shutdown;
pub mod store;
