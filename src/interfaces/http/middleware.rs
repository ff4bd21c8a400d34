//! Authentication middleware for Axum
//!
//! Privileged routes require an `X-API-Key` header. The key is hashed and
//! looked up in the configured registry; on success the resolved `Actor`
//! is stored in the request extensions. Role checks happen in the engine.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use tracing::{debug, warn};

use super::common::ApiResponse;
use crate::infrastructure::crypto::ApiKeyRegistry;

pub const API_KEY_HEADER: &str = "x-api-key";

/// Authentication error types
#[derive(Debug)]
pub enum AuthError {
    MissingApiKey,
    InvalidApiKey,
}

/// Authentication state shared by the middleware.
#[derive(Clone)]
pub struct AuthState {
    pub registry: Arc<ApiKeyRegistry>,
}

fn presented_key(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(API_KEY_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|k| !k.is_empty())
}

/// Reject requests without a valid API key; attach the actor otherwise.
pub async fn api_key_middleware(
    State(auth_state): State<AuthState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let Some(key) = presented_key(request.headers()) else {
        return auth_error_response(AuthError::MissingApiKey);
    };

    match auth_state.registry.authenticate(key) {
        Some(actor) => {
            debug!(actor = %actor, path = %request.uri().path(), "API key accepted");
            request.extensions_mut().insert(actor);
            next.run(request).await
        }
        None => {
            warn!(path = %request.uri().path(), "Rejected request with unknown API key");
            auth_error_response(AuthError::InvalidApiKey)
        }
    }
}

fn auth_error_response(error: AuthError) -> Response {
    let message = match error {
        AuthError::MissingApiKey => "Missing API key",
        AuthError::InvalidApiKey => "Invalid API key",
    };
    let body = Json(ApiResponse::<()>::error(message));
    (StatusCode::UNAUTHORIZED, body).into_response()
}
