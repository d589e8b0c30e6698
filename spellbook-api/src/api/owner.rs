//! Caller identity
//!
//! Authentication happens in front of this service; the authenticated user
//! arrives in the `X-User-Id` header.

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::api::error::ApiError;

pub const USER_HEADER: &str = "x-user-id";

/// Id of the user making the request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerId(pub String);

impl OwnerId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<S> FromRequestParts<S> for OwnerId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts
            .headers
            .get(USER_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| ApiError::Unauthorized("Unauthorized".to_string()))?;

        Ok(OwnerId(user.to_string()))
    }
}
