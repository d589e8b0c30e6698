//! Signed blob access
//!
//! Serves the URLs issued by the object store. Each request must carry a
//! valid, unexpired signature for its own method and key.

use axum::{
    body::Bytes,
    extract::{Path, Query, State, rejection::QueryRejection},
    http::{StatusCode, header},
    response::IntoResponse,
};
use serde::Deserialize;

use crate::api::AppState;
use crate::api::error::{ApiError, ApiResult};
use crate::gateway::{ObjectStore, SignatureError, SignedMethod};

#[derive(Debug, Deserialize)]
pub struct SignedQuery {
    pub expires: i64,
    pub signature: String,
}

fn authorize(
    state: &AppState,
    method: SignedMethod,
    key: &str,
    query: Result<Query<SignedQuery>, QueryRejection>,
) -> ApiResult<()> {
    let Query(query) =
        query.map_err(|_| ApiError::Forbidden("Missing URL signature".to_string()))?;

    state
        .signer
        .verify(method, key, query.expires, &query.signature)
        .map_err(|e| {
            tracing::warn!("Refused {:?} on {}: {}", method, key, e);
            match e {
                SignatureError::Expired => ApiError::Forbidden("URL has expired".to_string()),
                SignatureError::Invalid => ApiError::Forbidden("Invalid URL signature".to_string()),
            }
        })
}

fn content_type(key: &str) -> &'static str {
    if key.ends_with(".json") {
        "application/json"
    } else if key.ends_with(".txt") {
        "text/plain; charset=utf-8"
    } else {
        "application/octet-stream"
    }
}

/// GET /blobs/{*key}
pub async fn get_blob(
    State(state): State<AppState>,
    Path(key): Path<String>,
    query: Result<Query<SignedQuery>, QueryRejection>,
) -> ApiResult<impl IntoResponse> {
    authorize(&state, SignedMethod::Get, &key, query)?;

    let bytes = state.store.get_bytes(&key).await?;

    Ok(([(header::CONTENT_TYPE, content_type(&key))], bytes))
}

/// PUT /blobs/{*key}
pub async fn put_blob(
    State(state): State<AppState>,
    Path(key): Path<String>,
    query: Result<Query<SignedQuery>, QueryRejection>,
    body: Bytes,
) -> ApiResult<StatusCode> {
    authorize(&state, SignedMethod::Put, &key, query)?;
    tracing::debug!("Storing {} bytes at {}", body.len(), key);

    state.store.put_bytes(&key, body.to_vec()).await?;

    Ok(StatusCode::OK)
}
