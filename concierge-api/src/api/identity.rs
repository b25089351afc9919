//! Caller identity
//!
//! Authentication happens upstream; the authenticated user id arrives in the
//! `X-User-Id` header.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
};

use crate::db::events::EventOrigin;
use crate::error::ApiError;

pub const USER_ID_HEADER: &str = "x-user-id";

/// Id of the authenticated caller
///
/// Rejects with 401 when the header is missing or blank. Use
/// `Option<UserId>` for endpoints that also serve anonymous callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserId(pub String);

impl UserId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for UserId {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(|value| UserId(value.to_string()))
            .ok_or_else(|| ApiError::Unauthorized("Missing X-User-Id header".to_string()))
    }
}

/// Client address and user agent for the analytics log
///
/// Uses the first `X-Forwarded-For` hop, as the service runs behind a proxy.
pub fn event_origin(headers: &HeaderMap) -> EventOrigin {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
    };

    EventOrigin {
        ip_address: header("x-forwarded-for")
            .and_then(|hops| hops.split(',').next())
            .map(|hop| hop.trim().to_string()),
        user_agent: header("user-agent").map(str::to_string),
    }
}
