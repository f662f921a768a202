use axum::{
    Json, Router,
    body::Bytes,
    extract::{
        DefaultBodyLimit, Extension, Path, Query,
        rejection::{BytesRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{post, put},
};
use std::sync::Arc;
use tracing::Instrument;

use super::protocol::{
    ENDPOINT_RESERVE, ENDPOINT_SET, ENDPOINT_UPDATE, ErrorResponse, LockResponse, UpdateParams,
};
use crate::store::{Store, StoreError};

impl StoreError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            StoreError::NotFound(_) => StatusCode::NOT_FOUND,
            StoreError::Unauthorized => StatusCode::UNAUTHORIZED,
            StoreError::BadRequest(_) => StatusCode::BAD_REQUEST,
            StoreError::Timeout(_) => StatusCode::REQUEST_TIMEOUT,
            StoreError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for StoreError {
    fn into_response(self) -> Response {
        (
            self.status_code(),
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

/// Builds the public router around a shared store.
///
/// Unknown paths and known paths hit with the wrong method both fall through
/// to [`handle_not_found`]. Values are opaque and unbounded, so axum's default
/// body limit is lifted.
pub fn router(store: Arc<Store>) -> Router {
    Router::new()
        .route(
            ENDPOINT_RESERVE,
            post(handle_reserve).fallback(handle_not_found),
        )
        .route(
            ENDPOINT_UPDATE,
            post(handle_update).fallback(handle_not_found),
        )
        .route(ENDPOINT_SET, put(handle_set).fallback(handle_not_found))
        .fallback(handle_not_found)
        .layer(DefaultBodyLimit::disable())
        .layer(Extension(store))
}

pub async fn handle_reserve(
    Extension(store): Extension<Arc<Store>>,
    key: Result<Path<String>, PathRejection>,
) -> Result<(StatusCode, Json<LockResponse>), StoreError> {
    let Path(key) = key.map_err(bad_path)?;
    let span = tracing::debug_span!("reserve", key = %key);
    tracing::debug!(parent: &span, "POST reservation");

    let (token, value) = store.reserve(&key).instrument(span).await?;

    Ok((
        StatusCode::OK,
        Json(LockResponse {
            lock_id: token.0,
            value: String::from_utf8_lossy(&value).into_owned(),
        }),
    ))
}

pub async fn handle_update(
    Extension(store): Extension<Arc<Store>>,
    path: Result<Path<(String, String)>, PathRejection>,
    params: Result<Query<UpdateParams>, QueryRejection>,
    body: Result<Bytes, BytesRejection>,
) -> Result<StatusCode, StoreError> {
    let Path((key, lock_id)) = path.map_err(bad_path)?;
    let span = tracing::debug_span!("update", key = %key);
    tracing::debug!(parent: &span, "POST value");

    let body = body.map_err(|e| {
        tracing::error!("Failed to read update body: {}", e);
        StoreError::BadRequest("unable to read the request body".to_string())
    })?;

    let release = params
        .ok()
        .and_then(|Query(params)| params.release())
        .ok_or_else(|| {
            StoreError::BadRequest("release is a required query parameter (true|false)".to_string())
        })?;

    store
        .update(&key, &lock_id, body.to_vec(), release)
        .instrument(span)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn handle_set(
    Extension(store): Extension<Arc<Store>>,
    key: Result<Path<String>, PathRejection>,
    body: Result<Bytes, BytesRejection>,
) -> Result<(StatusCode, Json<LockResponse>), StoreError> {
    let Path(key) = key.map_err(bad_path)?;
    let span = tracing::debug_span!("set", key = %key);
    tracing::debug!(parent: &span, "PUT value");

    let body = body.map_err(|e| {
        tracing::error!("Failed to read set body: {}", e);
        StoreError::BadRequest("unable to read the request body".to_string())
    })?;

    let token = store.set(&key, body.to_vec()).instrument(span).await?;

    Ok((
        StatusCode::OK,
        Json(LockResponse {
            lock_id: token.0,
            value: String::new(),
        }),
    ))
}

fn bad_path(rejection: PathRejection) -> StoreError {
    tracing::warn!("Rejected request path: {}", rejection);
    StoreError::BadRequest(format!("invalid path parameter: {}", rejection.body_text()))
}

pub async fn handle_not_found() -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: "no such route".to_string(),
        }),
    )
}
