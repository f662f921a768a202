//! HTTP API Module
//!
//! Thin axum boundary around the [`Store`](crate::store::Store).
//!
//! Handlers extract the key, lock id, `release` flag and raw body, call one
//! store operation and translate the outcome: `StoreError` variants map 1:1
//! onto status codes and render as `{"error": "..."}`.
//!
//! | Method | Path                                    | Success                  |
//! |--------|-----------------------------------------|--------------------------|
//! | POST   | `/reservations/{key}`                   | 200 `{lock_id, value}`   |
//! | POST   | `/values/{key}/{lock_id}?release=bool`  | 204                      |
//! | PUT    | `/values/{key}`                         | 200 `{lock_id}`          |
//! | any    | anything else                           | 404 `{error}`            |

pub mod handlers;
pub mod protocol;

pub use handlers::router;

#[cfg(test)]
mod tests;
