//! Optional bearer-token guard for the control plane.
//!
//! With an empty token every request passes; otherwise requests must carry
//! `Authorization: Bearer <token>`.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::api::error::ApiError;

#[derive(Clone)]
pub struct AuthConfig {
    token: Arc<str>,
}

impl AuthConfig {
    pub fn new(token: impl AsRef<str>) -> Self {
        Self {
            token: Arc::from(token.as_ref().trim()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.token.is_empty()
    }

    /// Accepts an `Authorization` header value.
    pub fn authorize(&self, header: Option<&str>) -> bool {
        if !self.is_enabled() {
            return true;
        }
        header
            .and_then(|h| h.strip_prefix("Bearer "))
            .map(|presented| constant_time_eq(presented.trim().as_bytes(), self.token.as_bytes()))
            .unwrap_or(false)
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Middleware for `axum::middleware::from_fn_with_state`.
pub async fn require_bearer(
    State(auth): State<AuthConfig>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    if auth.authorize(header) {
        Ok(next.run(request).await)
    } else {
        tracing::debug!(path = %request.uri().path(), "rejected request without valid bearer token");
        Err(ApiError::Unauthorized)
    }
}
